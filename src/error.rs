//! Unified error type.

use http::{Method, StatusCode};

/// Boxed error raised inside a renderer or handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shorthand for `Result<T, tsu_utils::Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by tsu-utils' fallible operations.
///
/// Two families live here. Client-facing outcomes (`NotFound`,
/// `MethodNotAllowed`, `NotAcceptable`) are expected results of a request and
/// map to 4xx statuses. Everything else is a setup or server-side failure and
/// maps to `500`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),

    #[error("malformed media type `{0}`")]
    MalformedMediaType(String),

    #[error("no renderer registered for `{0}`")]
    RendererNotFound(String),

    #[error("none of the available representations is acceptable")]
    NotAcceptable,

    #[error("misconfigured application: {0}")]
    Misconfigured(String),

    #[error("renderer failed: {0}")]
    Render(#[source] BoxError),

    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    #[error("invalid route `{path}`: {reason}")]
    InvalidRoute { path: String, reason: String },

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed { allowed: Vec<Method> },
}

impl Error {
    /// Wraps any error raised while rendering a payload.
    pub fn render(err: impl Into<BoxError>) -> Self {
        Self::Render(err.into())
    }

    /// Wraps any error raised by application code inside a handler.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// The HTTP status this error is surfaced as.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound                  => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. }   => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotAcceptable             => StatusCode::NOT_ACCEPTABLE,
            _                               => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `true` for the designed 4xx outcomes, `false` for internal failures.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Render(Box::new(e))
    }
}
