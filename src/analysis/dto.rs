use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Per-nutrient level reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientRating {
    Low,
    Medium,
    High,
}

impl NutrientRating {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub rating: NutrientRating,
}

/// Server's coarse verdict on a food item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentCode {
    Green,
    Yellow,
    Red,
}

impl AssessmentCode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "red" => Some(Self::Red),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

/// Client-side aggregate used to colour the summary. There is no low level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryRating {
    Medium,
    High,
}

impl SummaryRating {
    pub fn from_nutrients(nutrients: &[Nutrient]) -> Self {
        if nutrients.iter().any(|n| n.rating == NutrientRating::High) {
            SummaryRating::High
        } else {
            SummaryRating::Medium
        }
    }
}

/// Analysis body as the server sends it. History keeps this shape, so an
/// unknown assessment code or rating is still representable here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSnapshot {
    pub overall_assessment: String,
    pub nutrients: Vec<NutrientSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientSnapshot {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    pub rating: String,
}

impl TryFrom<NutrientSnapshot> for Nutrient {
    type Error = ClientError;

    fn try_from(n: NutrientSnapshot) -> Result<Self, Self::Error> {
        let rating = NutrientRating::parse(&n.rating).ok_or_else(|| {
            ClientError::MalformedResponse(format!("unknown rating {:?} for {}", n.rating, n.name))
        })?;
        Ok(Self {
            name: n.name,
            value: n.value,
            unit: n.unit,
            rating,
        })
    }
}

impl From<&Nutrient> for NutrientSnapshot {
    fn from(n: &Nutrient) -> Self {
        Self {
            name: n.name.clone(),
            value: n.value,
            unit: n.unit.clone(),
            rating: n.rating.as_str().to_string(),
        }
    }
}

/// A fully validated analysis. Only built through [`AnalysisResult::new`] or
/// from a [`ResultSnapshot`] whose assessment code is recognised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResultSnapshot")]
pub struct AnalysisResult {
    pub overall_assessment: AssessmentCode,
    pub nutrients: Vec<Nutrient>,
    pub summary_rating: SummaryRating,
}

impl AnalysisResult {
    pub fn new(overall_assessment: AssessmentCode, nutrients: Vec<Nutrient>) -> Self {
        let summary_rating = SummaryRating::from_nutrients(&nutrients);
        Self {
            overall_assessment,
            nutrients,
            summary_rating,
        }
    }
}

impl TryFrom<ResultSnapshot> for AnalysisResult {
    type Error = ClientError;

    fn try_from(s: ResultSnapshot) -> Result<Self, Self::Error> {
        let code = AssessmentCode::parse(&s.overall_assessment).ok_or_else(|| {
            ClientError::MalformedResponse(format!(
                "unknown overall_assessment {:?}",
                s.overall_assessment
            ))
        })?;
        let nutrients = s
            .nutrients
            .into_iter()
            .map(Nutrient::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(code, nutrients))
    }
}

impl From<&AnalysisResult> for ResultSnapshot {
    fn from(r: &AnalysisResult) -> Self {
        Self {
            overall_assessment: r.overall_assessment.as_str().to_string(),
            nutrients: r.nutrients.iter().map(NutrientSnapshot::from).collect(),
        }
    }
}
