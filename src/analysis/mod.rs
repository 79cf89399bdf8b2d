pub mod coordinator;
pub mod dto;
pub mod presenter;
pub mod store;

pub use coordinator::{AnalysisOutcome, AnalysisRequestCoordinator, AnalysisSnapshot, AnalysisState};
pub use dto::{
    AnalysisResult, AssessmentCode, Nutrient, NutrientRating, NutrientSnapshot, ResultSnapshot,
    SummaryRating,
};
pub use presenter::{map_assessment, AssessmentText, ResultView};
pub use store::{ResultStore, ResultTicket, StoredResult};
