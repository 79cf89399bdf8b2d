//! Client-side flow for photographing food, getting it analysed by the
//! backend and showing the verdict, plus the user's analysis history.

pub mod analysis;
pub mod auth;
pub mod config;
pub mod error;
pub mod history;
pub mod images;
pub mod logging;
pub mod session;
pub mod state;
pub mod transport;

pub use analysis::{
    map_assessment, AnalysisOutcome, AnalysisRequestCoordinator, AnalysisResult, AnalysisSnapshot,
    AnalysisState, ResultStore, ResultTicket, ResultView,
};
pub use error::ClientError;
pub use history::{HistoryEntry, HistoryService};
pub use state::AppContext;
