//! Error types for the NASA API client.
//!
//! # Design
//! `RateLimited` is a distinguished case of a NASA API failure: callers that
//! only care about "the API refused us" can use `is_nasa_api_error`, while
//! callers that want to back off can match on `RateLimited` directly. Other
//! non-2xx statuses land in `HttpError` with the raw status and body and are
//! not translated further.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The JSON body carried an `error` key.
    #[error("NASA API error: {0}")]
    NasaApi(String),

    /// The server returned 429.
    #[error("you have exceeded your rate limit")]
    RateLimited,

    /// The server returned a non-2xx status other than 429.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// No response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the JSON we expected.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Rejected before any request was sent.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ApiError {
    /// True for failures reported by the API itself, including rate limiting.
    pub fn is_nasa_api_error(&self) -> bool {
        matches!(self, ApiError::NasaApi(_) | ApiError::RateLimited)
    }
}

impl From<ureq::Error> for ApiError {
    fn from(e: ureq::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
