use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime, UtcOffset,
};

use crate::{
    analysis::{map_assessment, AssessmentText, ResultSnapshot},
    error::ClientError,
};

/// One row of `GET /api/history/{user_id}` as the server sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub user_id: String,
    pub created_at: String,
    pub result: ResultSnapshot,
}

/// Display-ready history row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub created_at_formatted: String,
    pub result: ResultSnapshot,
}

impl HistoryEntry {
    pub fn from_record(r: HistoryRecord, offset: UtcOffset) -> Result<Self, ClientError> {
        let created_at = parse_timestamp(&r.created_at)?;
        let created_at_formatted = format_timestamp(created_at, offset)?;
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            created_at,
            created_at_formatted,
            result: r.result,
        })
    }

    pub fn text(&self) -> AssessmentText {
        map_assessment(&self.result.overall_assessment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

/// RFC 3339, or a naive ISO-8601 date-time taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, ClientError> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }

    // "2024-05-01 12:30:45" is as common as the T-separated form
    let normalized = match raw.as_bytes().get(10) {
        Some(b' ') => format!("{}T{}", &raw[..10], &raw[11..]),
        _ => raw.to_string(),
    };
    let naive = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(&normalized, &naive)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|e| ClientError::MalformedResponse(format!("created_at {raw:?}: {e}")))
}

pub(crate) fn format_timestamp(
    ts: OffsetDateTime,
    offset: UtcOffset,
) -> Result<String, ClientError> {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    ts.to_offset(offset)
        .format(&fmt)
        .map_err(|e| ClientError::MalformedResponse(e.to_string()))
}
