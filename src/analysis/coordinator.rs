use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{
    dto::AnalysisResult,
    store::{ResultStore, ResultTicket},
};
use crate::{
    error::ClientError,
    images::{ImageAcquisition, ImageFile, ImagePicker, ImageSource},
    session::SessionContext,
    state::AppContext,
    transport::{MultipartUpload, Transport},
};

pub const ANALYZE_PATH: &str = "/api/analyze";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Selecting,
    Uploading,
    Success(ResultTicket),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSnapshot {
    pub state: AnalysisState,
    pub loading: bool,
}

impl AnalysisSnapshot {
    fn idle() -> Self {
        Self {
            state: AnalysisState::Idle,
            loading: false,
        }
    }

    /// A cycle owns the coordinator while it is picking or uploading.
    pub fn is_active(&self) -> bool {
        matches!(self.state, AnalysisState::Selecting | AnalysisState::Uploading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            AnalysisState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

/// How a call to [`AnalysisRequestCoordinator::run_analysis`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed(ResultTicket),
    Failed(ClientError),
    Cancelled,
    /// Another cycle was active; nothing happened.
    Busy,
}

/// Drives one pick → upload → parse → store cycle at a time.
pub struct AnalysisRequestCoordinator {
    acquisition: ImageAcquisition,
    transport: Arc<dyn Transport>,
    session: Arc<SessionContext>,
    results: Arc<ResultStore>,
    state: Arc<watch::Sender<AnalysisSnapshot>>,
}

impl AnalysisRequestCoordinator {
    pub fn new(ctx: &AppContext, picker: Arc<dyn ImagePicker>) -> Self {
        let (state, _) = watch::channel(AnalysisSnapshot::idle());
        Self {
            acquisition: ImageAcquisition::new(picker),
            transport: ctx.transport.clone(),
            session: ctx.session.clone(),
            results: ctx.results.clone(),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        self.state.borrow().clone()
    }

    /// Kicks off a cycle in the background. Returns `false` when a cycle is
    /// already active, in which case nothing changes.
    pub fn start_analysis(self: &Arc<Self>, source: ImageSource, user_id: Option<String>) -> bool {
        let Some(cycle) = self.claim() else {
            return false;
        };
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.drive(cycle, source, user_id).await;
        });
        true
    }

    /// Same cycle as [`start_analysis`](Self::start_analysis), awaited in place.
    pub async fn run_analysis(
        &self,
        source: ImageSource,
        user_id: Option<String>,
    ) -> AnalysisOutcome {
        let Some(cycle) = self.claim() else {
            return AnalysisOutcome::Busy;
        };
        self.drive(cycle, source, user_id).await
    }

    /// Acknowledges a finished cycle. No-op while a cycle is active.
    pub fn reset(&self) {
        self.state.send_if_modified(|snap| {
            if matches!(snap.state, AnalysisState::Success(_) | AnalysisState::Error(_)) {
                *snap = AnalysisSnapshot::idle();
                true
            } else {
                false
            }
        });
    }

    fn claim(&self) -> Option<Cycle> {
        let cycle = Cycle::claim(&self.state);
        if cycle.is_none() {
            debug!("analysis already in progress; ignoring request");
        }
        cycle
    }

    #[instrument(skip(self, cycle, user_id))]
    async fn drive(
        &self,
        mut cycle: Cycle,
        source: ImageSource,
        user_id: Option<String>,
    ) -> AnalysisOutcome {
        let file = match self.acquisition.acquire(source).await {
            Ok(file) => file,
            Err(ClientError::UserCancelled) => {
                cycle.finish(AnalysisState::Idle);
                return AnalysisOutcome::Cancelled;
            }
            Err(e) => {
                warn!(error = %e, "image acquisition failed");
                cycle.finish(AnalysisState::Error(message_for(&e)));
                return AnalysisOutcome::Failed(e);
            }
        };

        let user_id = user_id.or_else(|| self.session.user_id());
        cycle.uploading();
        match self.upload(file, user_id).await {
            Ok(result) => {
                info!(
                    assessment = result.overall_assessment.as_str(),
                    summary = ?result.summary_rating,
                    nutrients = result.nutrients.len(),
                    "analysis succeeded"
                );
                let ticket = self.results.set(result);
                cycle.finish(AnalysisState::Success(ticket));
                AnalysisOutcome::Completed(ticket)
            }
            Err(e) => {
                warn!(error = %e, "analysis failed");
                cycle.finish(AnalysisState::Error(message_for(&e)));
                AnalysisOutcome::Failed(e)
            }
        }
    }

    async fn upload(
        &self,
        file: ImageFile,
        user_id: Option<String>,
    ) -> Result<AnalysisResult, ClientError> {
        let fields = user_id.into_iter().map(|id| ("user_id", id)).collect();
        let reply = self
            .transport
            .post_multipart(
                ANALYZE_PATH,
                MultipartUpload {
                    file_field: "file",
                    file,
                    fields,
                },
            )
            .await?;
        if reply.status != 200 {
            return Err(ClientError::ServerError {
                status: reply.status,
            });
        }
        reply.json::<AnalysisResult>()
    }
}

fn message_for(e: &ClientError) -> String {
    e.user_message().unwrap_or_else(|| e.to_string())
}

/// One claimed cycle. The active states are the re-entrancy lock, so the
/// terminal publish in [`finish`](Self::finish) is also the release.
/// Dropping an unfinished cycle (panic, dropped future) puts a picker-stage
/// cycle back to Idle and turns an interrupted upload into an error; either
/// way loading ends false.
struct Cycle {
    state: Arc<watch::Sender<AnalysisSnapshot>>,
    finished: bool,
}

impl Cycle {
    fn claim(state: &Arc<watch::Sender<AnalysisSnapshot>>) -> Option<Self> {
        let claimed = state.send_if_modified(|snap| {
            if snap.is_active() {
                return false;
            }
            *snap = AnalysisSnapshot {
                state: AnalysisState::Selecting,
                loading: false,
            };
            true
        });
        claimed.then(|| Self {
            state: Arc::clone(state),
            finished: false,
        })
    }

    fn uploading(&self) {
        self.state.send_replace(AnalysisSnapshot {
            state: AnalysisState::Uploading,
            loading: true,
        });
    }

    fn finish(&mut self, outcome: AnalysisState) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.state.send_replace(AnalysisSnapshot {
            state: outcome,
            loading: false,
        });
    }
}

impl Drop for Cycle {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.state.send_modify(|snap| {
            snap.state = match snap.state {
                AnalysisState::Uploading => AnalysisState::Error("Analysis was interrupted".into()),
                _ => AnalysisState::Idle,
            };
            snap.loading = false;
        });
    }
}
