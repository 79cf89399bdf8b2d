/// Everything that can go wrong between picking a photo and showing a result.
///
/// None of these escape a screen as a fault: the coordinator and the history
/// service turn them into a short message via [`ClientError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("user id required")]
    AuthRequired,

    #[error("image selection cancelled")]
    UserCancelled,

    #[error("image acquisition failed: {0}")]
    AcquisitionFailed(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("server responded with status {status}")]
    ServerError { status: u16 },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no analysis result available")]
    NoResult,
}

impl ClientError {
    /// Message shown to the user. `None` means stay silent.
    pub fn user_message(&self) -> Option<String> {
        let msg = match self {
            ClientError::UserCancelled => return None,
            ClientError::AuthRequired => "Please sign in first".to_string(),
            ClientError::AcquisitionFailed(_) => "Failed to choose image".to_string(),
            ClientError::NetworkError(_) => "Request failed, please check your network".to_string(),
            ClientError::ServerError { status } => format!("Server error: {status}"),
            ClientError::MalformedResponse(_) => {
                "Server returned data in an unexpected format".to_string()
            }
            ClientError::NoResult => "No analysis data".to_string(),
        };
        Some(msg)
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, ClientError::UserCancelled)
    }
}
