use serde::Serialize;

use super::{
    dto::{AnalysisResult, AssessmentCode},
    store::{ResultStore, ResultTicket},
};
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssessmentText {
    pub label: &'static str,
    pub suggestion: &'static str,
}

const FALLBACK: AssessmentText = AssessmentText {
    label: "Analysis result",
    suggestion: "Follow a balanced diet based on your own condition.",
};

pub fn assessment_text(code: AssessmentCode) -> AssessmentText {
    match code {
        AssessmentCode::Green => AssessmentText {
            label: "Recommended",
            suggestion: "Nutrient profile is balanced; a good choice.",
        },
        AssessmentCode::Yellow => AssessmentText {
            label: "Consume in moderation",
            suggestion: "Some nutrients run high; fine occasionally, not habitually.",
        },
        AssessmentCode::Red => AssessmentText {
            label: "Limit intake",
            suggestion: "High in fat, sodium, or sugar; minimize for your health.",
        },
    }
}

/// Label and suggestion for a raw assessment code; unknown codes get the
/// generic pair.
pub fn map_assessment(code: &str) -> AssessmentText {
    AssessmentCode::parse(code)
        .map(assessment_text)
        .unwrap_or(FALLBACK)
}

/// What the result screen renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub result: AnalysisResult,
    pub text: AssessmentText,
}

impl ResultView {
    pub fn new(result: AnalysisResult) -> Self {
        let text = assessment_text(result.overall_assessment);
        Self { result, text }
    }

    /// Resolves the navigation ticket. A missing or superseded result is
    /// [`ClientError::NoResult`].
    pub fn load(store: &ResultStore, ticket: ResultTicket) -> Result<Self, ClientError> {
        store
            .get_for(ticket)
            .map(Self::new)
            .ok_or(ClientError::NoResult)
    }
}
