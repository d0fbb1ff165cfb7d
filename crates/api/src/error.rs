use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Session not ready: {0}")]
    NotReady(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Api(String),
}

impl ApiError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Auth(_) => "Login failed. Check your phone number and PIN.",
            ApiError::NotReady(_) => "Session is starting up. Please wait.",
            ApiError::Network(_) => "Connection error. Check that the server is reachable.",
            ApiError::Status(_) => "Server error. Please try again later.",
            ApiError::Decode(_) => "Server sent an unexpected response.",
            ApiError::InvalidUrl(_) => "Server address is invalid. Check your config.",
            ApiError::Api(_) => "Request was rejected by the server.",
        }
    }

    /// Text to show inline: the backend's own message for application
    /// failures, the generic message for everything else.
    pub fn display_message(&self) -> String {
        match self {
            ApiError::Api(msg) if !msg.is_empty() => msg.clone(),
            ApiError::Auth(msg) if !msg.is_empty() => msg.clone(),
            _ => self.user_message().to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
