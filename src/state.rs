use std::sync::Arc;

use crate::analysis::ResultStore;
use crate::config::AppConfig;
use crate::session::SessionContext;
use crate::transport::{HttpTransport, Transport};

/// Composition root. Built once and handed to every service constructor.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub transport: Arc<dyn Transport>,
    pub session: Arc<SessionContext>,
    pub results: Arc<ResultStore>,
}

impl AppContext {
    pub fn init() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = AppConfig::from_env()?;
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.http)?) as Arc<dyn Transport>;
        tracing::info!(api_url = %config.http.api_url, "app context ready");
        Ok(Self::from_parts(Arc::new(config), transport))
    }

    pub fn from_parts(config: Arc<AppConfig>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            session: Arc::new(SessionContext::new()),
            results: Arc::new(ResultStore::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn fake(transport: Arc<crate::transport::fake::FakeTransport>) -> Self {
        Self::from_parts(Arc::new(AppConfig::default()), transport)
    }
}
