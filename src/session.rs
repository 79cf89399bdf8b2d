use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub openid: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoginState {
    Pending,
    Failed,
    Ready(Session),
}

/// Current user identity. Written once by the login bootstrap, read-only
/// afterwards. A failed login is recorded so waiters can give up; a later
/// login may still replace it.
#[derive(Debug)]
pub struct SessionContext {
    tx: watch::Sender<LoginState>,
}

impl Default for SessionContext {
    fn default() -> Self {
        let (tx, _) = watch::channel(LoginState::Pending);
        Self { tx }
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the session. Returns `false` and keeps the first value if a
    /// session was already set.
    pub fn set(&self, session: Session) -> bool {
        let mut stored = false;
        self.tx.send_if_modified(|current| {
            if matches!(current, LoginState::Ready(_)) {
                return false;
            }
            *current = LoginState::Ready(session.clone());
            stored = true;
            true
        });
        if stored {
            info!(user_id = ?session.user_id, "session established");
        } else {
            warn!("session already established; ignoring second login");
        }
        stored
    }

    /// Records that the login bootstrap gave up without a session.
    pub fn mark_failed(&self) {
        self.tx.send_if_modified(|current| {
            if *current != LoginState::Pending {
                return false;
            }
            *current = LoginState::Failed;
            true
        });
    }

    pub fn session(&self) -> Option<Session> {
        match &*self.tx.borrow() {
            LoginState::Ready(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn openid(&self) -> Option<String> {
        self.session().map(|s| s.openid)
    }

    pub fn user_id(&self) -> Option<String> {
        self.session().and_then(|s| s.user_id)
    }

    /// Waits for the login bootstrap to settle. Resolves to `None` when the
    /// login failed or produced no user id.
    pub async fn wait_for_user_id(&self) -> Option<String> {
        let mut rx = self.tx.subscribe();
        let settled = rx.wait_for(|state| *state != LoginState::Pending).await;
        let user_id = match settled.as_deref() {
            Ok(LoginState::Ready(s)) => s.user_id.clone(),
            _ => None,
        };
        user_id
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;

    fn session(user: &str) -> Session {
        Session {
            openid: format!("openid-{user}"),
            user_id: Some(user.into()),
        }
    }

    #[test]
    fn empty_until_set() {
        let ctx = SessionContext::new();
        assert_eq!(ctx.user_id(), None);
        assert_eq!(ctx.openid(), None);
        assert!(ctx.session().is_none());
    }

    #[test]
    fn write_once() {
        let ctx = SessionContext::new();
        assert!(ctx.set(session("u1")));
        assert!(!ctx.set(session("u2")));
        assert_eq!(ctx.user_id().as_deref(), Some("u1"));
        assert_eq!(ctx.openid().as_deref(), Some("openid-u1"));
    }

    #[test]
    fn failed_login_does_not_block_a_later_one() {
        let ctx = SessionContext::new();
        ctx.mark_failed();
        assert!(ctx.session().is_none());
        assert!(ctx.set(session("u1")));
        ctx.mark_failed();
        assert_eq!(ctx.user_id().as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn wait_for_user_id_resolves_after_login() {
        let ctx = Arc::new(SessionContext::new());
        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.wait_for_user_id().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        ctx.set(session("u7"));
        let id = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter resolves")
            .unwrap();
        assert_eq!(id.as_deref(), Some("u7"));
    }

    #[tokio::test]
    async fn wait_for_user_id_returns_immediately_when_known() {
        let ctx = SessionContext::new();
        ctx.set(session("u3"));
        assert_eq!(ctx.wait_for_user_id().await.as_deref(), Some("u3"));
    }

    #[tokio::test]
    async fn wait_for_user_id_gives_up_without_an_id() {
        let ctx = SessionContext::new();
        ctx.set(Session {
            openid: "o".into(),
            user_id: None,
        });
        let id = tokio::time::timeout(Duration::from_millis(200), ctx.wait_for_user_id())
            .await
            .expect("does not hang");
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn wait_for_user_id_gives_up_after_failed_login() {
        let ctx = Arc::new(SessionContext::new());
        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.wait_for_user_id().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.mark_failed();
        let id = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter resolves")
            .unwrap();
        assert_eq!(id, None);
    }
}
