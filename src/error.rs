use thiserror::Error;

use crate::config::RetryPolicy;

/// A `Result` carrying this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Possible failures while talking to the price list API or its token endpoints.
#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced a response (connection, timeout, TLS).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status, after any retries.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The body could not be decoded in the negotiated format.
    #[error("unable to decode response: {0}")]
    Decode(String),

    /// A required query parameter was absent or empty.
    #[error("missing required argument `{0}`")]
    MissingArgument(&'static str),

    /// A configured endpoint is not a valid URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The client configuration cannot satisfy the request.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this failure came from a status the default retry policy retries on.
    ///
    /// By the time an [`Error::Api`] is returned those retries have already run,
    /// so this only tells the caller that trying again later may help.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { status, .. } => RetryPolicy::default().should_retry_status(*status),
            _ => false,
        }
    }

    /// The HTTP status code, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}
