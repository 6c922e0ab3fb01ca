//! Response DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The query payload handed to `Client::get`, before `api_key` is added.
/// Numbers and booleans are passed in their query-string form.
pub type Payload = std::collections::BTreeMap<String, String>;

/// Whether an APOD entry is a still image or an embedded video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    #[serde(other)]
    Other,
}

/// One Astronomy Picture of the Day entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub date: NaiveDate,
    pub title: String,
    pub explanation: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdurl: Option<String>,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default)]
    pub service_version: String,
    /// Only present for videos when `thumbs=true` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}
