pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// True for failures of a call to the remote API, as opposed to local
    /// validation or state errors. These are the errors surfaced through the
    /// event sink; validation errors stay field-scoped at the call site.
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            Error::Reqwest(_) | Error::RequestFailed { .. } | Error::Json(_)
        )
    }
}
