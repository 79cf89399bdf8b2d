use serde::{Deserialize, Serialize};

/// Request body for `POST /api/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub code: String,
}

/// Login reply. Every field is optional on the wire; a reply without
/// `openid` counts as a failed login.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub openid: Option<String>,
    pub user_id: Option<String>,
    /// Error detail the backend attaches to rejections.
    pub detail: Option<String>,
}
