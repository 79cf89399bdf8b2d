use async_trait::async_trait;
use tracing::{error, info, instrument};

use super::dto::{LoginRequest, LoginResponse};
use crate::{
    session::{Session, SessionContext},
    state::AppContext,
};

pub const LOGIN_PATH: &str = "/api/login";

/// Platform hook that yields a one-time login code.
#[async_trait]
pub trait LoginCodeProvider: Send + Sync {
    async fn login_code(&self) -> anyhow::Result<String>;
}

/// Best-effort startup login. Failures are logged and recorded on the
/// session so `wait_for_user_id` stops waiting; features that need a user
/// id report `AuthRequired` later instead.
#[instrument(skip_all)]
pub async fn silent_login(ctx: &AppContext, codes: &dyn LoginCodeProvider) -> Option<Session> {
    if let Some(existing) = ctx.session.session() {
        return Some(existing);
    }
    let session = login(ctx, codes).await;
    if session.is_none() {
        ctx.session.mark_failed();
    }
    session
}

async fn login(ctx: &AppContext, codes: &dyn LoginCodeProvider) -> Option<Session> {
    let code = match codes.login_code().await {
        Ok(code) if !code.is_empty() => code,
        Ok(_) => {
            error!("platform returned an empty login code");
            return None;
        }
        Err(e) => {
            error!(error = %e, "platform login failed");
            return None;
        }
    };

    let body = match serde_json::to_value(LoginRequest { code }) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "encode login request");
            return None;
        }
    };
    let reply = match ctx.transport.post_json(LOGIN_PATH, &body).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "login request failed");
            return None;
        }
    };

    let parsed = reply.json::<LoginResponse>();
    match (reply.status, parsed) {
        (200, Ok(LoginResponse {
            openid: Some(openid),
            user_id,
            ..
        })) if !openid.is_empty() => establish(&ctx.session, Session { openid, user_id }),
        (status, Ok(resp)) => {
            let detail = resp.detail.as_deref().unwrap_or("no openid in response");
            error!(status, detail, "login rejected");
            None
        }
        (status, Err(e)) => {
            error!(status, error = %e, "login reply unreadable");
            None
        }
    }
}

fn establish(session: &SessionContext, new: Session) -> Option<Session> {
    session.set(new);
    let current = session.session();
    if let Some(s) = &current {
        info!(user_id = ?s.user_id, "silent login complete");
    }
    current
}

#[cfg(test)]
mod login_tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::transport::{fake::FakeTransport, HttpReply, TransportError};

    struct FixedCode(Option<&'static str>);

    #[async_trait]
    impl LoginCodeProvider for FixedCode {
        async fn login_code(&self) -> anyhow::Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("wx.login failed"))
        }
    }

    fn ctx() -> (AppContext, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::new());
        (AppContext::fake(transport.clone()), transport)
    }

    #[tokio::test]
    async fn successful_login_populates_session() {
        let (ctx, transport) = ctx();
        transport.reply_json(LOGIN_PATH, 200, json!({"openid": "o-1", "user_id": "user_o-1"}));

        let session = silent_login(&ctx, &FixedCode(Some("code-123"))).await.unwrap();
        assert_eq!(session.openid, "o-1");
        assert_eq!(ctx.session.user_id().as_deref(), Some("user_o-1"));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].json, Some(json!({"code": "code-123"})));
    }

    #[tokio::test]
    async fn failures_leave_session_empty() {
        let replies: Vec<Result<HttpReply, TransportError>> = vec![
            Ok(HttpReply::new(200, json!({"user_id": "u"}).to_string())),
            Ok(HttpReply::new(200, json!({"openid": "", "user_id": "u"}).to_string())),
            Ok(HttpReply::new(401, json!({"detail": "invalid code"}).to_string())),
            Ok(HttpReply::new(500, "oops")),
            Err(TransportError::Request("unreachable".into())),
        ];
        for reply in replies {
            let (ctx, transport) = ctx();
            transport.reply(LOGIN_PATH, reply);
            assert!(silent_login(&ctx, &FixedCode(Some("c"))).await.is_none());
            assert!(ctx.session.session().is_none());
            assert_eq!(ctx.session.wait_for_user_id().await, None);
        }
    }

    #[tokio::test]
    async fn platform_failure_skips_network() {
        let (ctx, transport) = ctx();
        assert!(silent_login(&ctx, &FixedCode(None)).await.is_none());
        assert!(silent_login(&ctx, &FixedCode(Some(""))).await.is_none());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn login_without_user_id_releases_waiters() {
        let (ctx, transport) = ctx();
        transport.reply_json(LOGIN_PATH, 200, json!({"openid": "o-1"}));

        let session = silent_login(&ctx, &FixedCode(Some("c"))).await.unwrap();
        assert_eq!(session.user_id, None);
        assert_eq!(ctx.session.wait_for_user_id().await, None);
    }

    #[tokio::test]
    async fn retry_after_failure_can_still_log_in() {
        let (ctx, transport) = ctx();
        transport.reply(LOGIN_PATH, Ok(HttpReply::new(500, "oops")));
        transport.reply_json(LOGIN_PATH, 200, json!({"openid": "o-1", "user_id": "u1"}));

        assert!(silent_login(&ctx, &FixedCode(Some("a"))).await.is_none());
        assert!(silent_login(&ctx, &FixedCode(Some("b"))).await.is_some());
        assert_eq!(ctx.session.wait_for_user_id().await.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn runs_once_per_session() {
        let (ctx, transport) = ctx();
        transport.reply_json(LOGIN_PATH, 200, json!({"openid": "o-1", "user_id": "u1"}));

        silent_login(&ctx, &FixedCode(Some("a"))).await.unwrap();
        let again = silent_login(&ctx, &FixedCode(Some("b"))).await.unwrap();
        assert_eq!(again.user_id.as_deref(), Some("u1"));
        assert_eq!(transport.calls().len(), 1);
    }
}
