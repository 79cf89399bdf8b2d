use std::sync::Arc;

use reqwest::Url;
use time::UtcOffset;
use tracing::{info, instrument, warn};

use super::dto::{HistoryEntry, HistoryRecord, Pagination};
use crate::{
    analysis::{AnalysisResult, ResultStore, ResultTicket},
    error::ClientError,
    session::SessionContext,
    state::AppContext,
    transport::Transport,
};

pub const HISTORY_PATH: &str = "/api/history";

pub struct HistoryService {
    transport: Arc<dyn Transport>,
    session: Arc<SessionContext>,
    results: Arc<ResultStore>,
    display_offset: UtcOffset,
}

impl HistoryService {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            transport: ctx.transport.clone(),
            session: ctx.session.clone(),
            results: ctx.results.clone(),
            display_offset: ctx.config.display_offset,
        }
    }

    /// Past analyses for `user_id`, in server order. Without a user id this
    /// fails with [`ClientError::AuthRequired`] before touching the network.
    pub async fn fetch_history(
        &self,
        user_id: Option<&str>,
    ) -> Result<Vec<HistoryEntry>, ClientError> {
        self.fetch(user_id, None).await
    }

    pub async fn fetch_history_page(
        &self,
        user_id: Option<&str>,
        page: Pagination,
    ) -> Result<Vec<HistoryEntry>, ClientError> {
        self.fetch(user_id, Some(page)).await
    }

    /// History of whoever is signed in.
    pub async fn fetch_current(&self) -> Result<Vec<HistoryEntry>, ClientError> {
        let user_id = self.session.user_id();
        self.fetch_history(user_id.as_deref()).await
    }

    /// Puts a past result in the store so the result screen can show it.
    pub fn open(&self, entry: &HistoryEntry) -> Result<ResultTicket, ClientError> {
        let result = AnalysisResult::try_from(entry.result.clone())?;
        Ok(self.results.set(result))
    }

    #[instrument(skip(self))]
    async fn fetch(
        &self,
        user_id: Option<&str>,
        page: Option<Pagination>,
    ) -> Result<Vec<HistoryEntry>, ClientError> {
        let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
            warn!("history requested without a user id");
            return Err(ClientError::AuthRequired);
        };

        let path = history_path(user_id, page)?;
        let reply = self.transport.get(&path).await.map_err(|e| {
            warn!(error = %e, "history request failed");
            ClientError::from(e)
        })?;
        if !reply.is_success() {
            warn!(status = reply.status, "history request rejected");
            return Err(ClientError::ServerError {
                status: reply.status,
            });
        }

        let records: Vec<HistoryRecord> = reply.json()?;
        let entries = records
            .into_iter()
            .map(|r| HistoryEntry::from_record(r, self.display_offset))
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = entries.len(), "history loaded");
        Ok(entries)
    }
}

/// `/api/history/{user_id}` with the id as one encoded segment, plus the
/// page as a query when given.
fn history_path(user_id: &str, page: Option<Pagination>) -> Result<String, ClientError> {
    let invalid = || ClientError::NetworkError(format!("cannot build history url for {user_id:?}"));
    let mut url = Url::parse("http://localhost").map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(HISTORY_PATH.split('/').filter(|s| !s.is_empty()))
        .push(user_id);
    if let Some(p) = page {
        url.query_pairs_mut()
            .append_pair("skip", &p.skip.to_string())
            .append_pair("limit", &p.limit.to_string());
    }
    Ok(match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    })
}
