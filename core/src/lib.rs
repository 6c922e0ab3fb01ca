//! Blocking client for NASA's open data API.
//!
//! # Overview
//! `Client` holds the API key and the rate-limit counters from the latest
//! response. Resources are reached through accessors such as
//! `Client::apod`, which borrow the client and route every request through
//! `Client::get`.
//!
//! # Design
//! - `get` is split into `build_get` and `parse_response` around a
//!   `Transport`, so request shaping and response validation run without I/O.
//! - The default transport is a blocking `ureq` agent.
//! - Rate limiting surfaces as `ApiError::RateLimited`; nothing is retried.

pub mod apod;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use apod::{Apod, ApodQuery};
pub use client::Client;
pub use config::{ClientConfig, DEMO_KEY};
pub use error::{ApiError, ApiResult};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{MediaType, Payload, Picture};
