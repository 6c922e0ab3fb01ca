//! The NASA API client: key handling, rate-limit bookkeeping, and the single
//! GET operation every resource goes through.
//!
//! # Design
//! `get` is split into `build_get` (payload to `HttpRequest`) and
//! `parse_response` (`HttpResponse` to JSON body), with the `Transport` doing
//! the I/O in between. `parse_response` records the rate-limit headers before
//! looking at the status or body, so the counters track the latest response
//! even when the call fails.
//!
//! Rate-limit state is plain fields mutated through `&mut self`; the client is
//! meant for one thread at a time.

use std::fmt;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::apod::Apod;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::Payload;

pub const RATELIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATELIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Blocking client for the NASA open data API.
#[derive(Debug, Clone)]
pub struct Client<T: Transport = UreqTransport> {
    api_key: String,
    base_url: String,
    transport: T,
    ratelimit_limit: Option<u64>,
    ratelimit_remaining: Option<u64>,
}

impl Client {
    /// Create a client for `api.nasa.gov`. `None` falls back to `DEMO_KEY`.
    pub fn new(api_key: Option<&str>) -> Self {
        let config = match api_key {
            Some(key) => ClientConfig::new().api_key(key),
            None => ClientConfig::new(),
        };
        Self::with_config(config)
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Create a client keyed from `NASA_API_KEY`.
    pub fn from_env() -> Self {
        Self::with_config(ClientConfig::from_env())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        if config.uses_demo_key() {
            warn!("Using default API key. This is not recommended; request a personal key at https://api.nasa.gov");
        }
        Self {
            api_key: config.effective_api_key().to_string(),
            base_url: config.base_url,
            transport,
            ratelimit_limit: None,
            ratelimit_remaining: None,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request quota reported by the most recent response, if any.
    pub fn ratelimit_limit(&self) -> Option<u64> {
        self.ratelimit_limit
    }

    /// Requests left in the current window, per the most recent response.
    pub fn ratelimit_remaining(&self) -> Option<u64> {
        self.ratelimit_remaining
    }

    /// Astronomy Picture of the Day.
    pub fn apod(&mut self) -> Apod<'_, T> {
        Apod::new(self)
    }

    /// Issue a GET to `url` with `payload` as query parameters and return the
    /// JSON body.
    pub fn get(&mut self, url: &str, payload: Payload) -> ApiResult<Value> {
        let request = self.build_get(url, payload);
        debug!(url = %request.url, "GET");
        let response = self.transport.execute(&request)?;
        self.parse_response(response)
    }

    /// Attach the API key to `payload` and describe the request.
    pub fn build_get(&self, url: &str, mut payload: Payload) -> HttpRequest {
        payload.insert("api_key".to_string(), self.api_key.clone());
        HttpRequest {
            url: url.to_string(),
            query: payload.into_iter().collect(),
        }
    }

    /// Record rate-limit headers, then validate status and body.
    pub fn parse_response(&mut self, response: HttpResponse) -> ApiResult<Value> {
        self.record_rate_limit(&response);

        if response.status == 429 {
            return Err(ApiError::RateLimited);
        }
        if !response.is_success() {
            return Err(ApiError::HttpError {
                status: response.status,
                body: response.body,
            });
        }

        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        if let Some(error) = body.get("error") {
            return Err(ApiError::NasaApi(error_message(error)));
        }
        Ok(body)
    }

    fn record_rate_limit(&mut self, response: &HttpResponse) {
        self.ratelimit_limit = header_u64(response, RATELIMIT_LIMIT_HEADER);
        self.ratelimit_remaining = header_u64(response, RATELIMIT_REMAINING_HEADER);
        trace!(
            limit = ?self.ratelimit_limit,
            remaining = ?self.ratelimit_remaining,
            "rate limit updated"
        );
    }
}

impl<T: Transport> fmt::Display for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<NasaAPI api_key=\"{}\">", self.api_key)
    }
}

/// Missing or malformed headers read as unset.
fn header_u64(response: &HttpResponse, name: &str) -> Option<u64> {
    response.header(name).and_then(|v| v.trim().parse().ok())
}

/// The `error` value is usually a string, but api.data.gov wraps gateway
/// errors as `{"code": ..., "message": ...}`.
fn error_message(error: &Value) -> String {
    match error {
        Value::String(msg) => msg.clone(),
        Value::Object(map) => match map.get("message") {
            Some(Value::String(msg)) => msg.clone(),
            _ => error.to_string(),
        },
        other => other.to_string(),
    }
}
