use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::dto::AnalysisResult;

/// Correlates a stored result with the analysis that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultTicket(pub Uuid);

impl ResultTicket {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub ticket: ResultTicket,
    pub result: AnalysisResult,
}

/// Single slot handing the latest result to the result screen.
/// Last write wins; reads never clear it.
#[derive(Debug, Default)]
pub struct ResultStore {
    slot: Mutex<Option<StoredResult>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, result: AnalysisResult) -> ResultTicket {
        let ticket = ResultTicket::fresh();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(StoredResult { ticket, result });
        debug!(ticket = %ticket.0, "result stored");
        ticket
    }

    pub fn get(&self) -> Option<StoredResult> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The stored result, but only if `ticket` still names the latest write.
    pub fn get_for(&self, ticket: ResultTicket) -> Option<AnalysisResult> {
        self.get()
            .filter(|stored| stored.ticket == ticket)
            .map(|stored| stored.result)
    }
}
