//! Astronomy Picture of the Day resource.
//!
//! # Design
//! `Apod` borrows its `Client` mutably for as long as it lives, so every call
//! shares the client's key and updates its rate-limit counters. A fresh proxy
//! is handed out by each `Client::apod` call; it holds nothing else.
//!
//! Parameter combinations the endpoint would reject are caught by
//! `ApodQuery::validate` before a request is spent against the quota.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::Client;
use crate::error::{ApiError, ApiResult};
use crate::http::{Transport, UreqTransport};
use crate::types::{Payload, Picture};

pub const APOD_PATH: &str = "/planetary/apod";

/// Most entries the endpoint returns for a `count` query.
pub const MAX_COUNT: u32 = 100;

/// The archive starts on 1995-06-16.
pub fn first_apod_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 6, 16).unwrap_or(NaiveDate::MIN)
}

/// Query parameters for the APOD endpoint. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApodQuery {
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub count: Option<u32>,
    pub hd: bool,
    pub thumbs: bool,
}

impl ApodQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Ask for the high-resolution image URL.
    pub fn hd(mut self, hd: bool) -> Self {
        self.hd = hd;
        self
    }

    /// Ask for a thumbnail URL on video entries.
    pub fn thumbs(mut self, thumbs: bool) -> Self {
        self.thumbs = thumbs;
        self
    }

    /// True when the endpoint will answer with a list rather than one entry.
    pub fn returns_list(&self) -> bool {
        self.count.is_some() || self.start_date.is_some()
    }

    pub fn validate(&self) -> ApiResult<()> {
        let invalid = |msg: &str| Err(ApiError::InvalidParameter(msg.to_string()));

        if let Some(count) = self.count {
            if self.date.is_some() || self.start_date.is_some() || self.end_date.is_some() {
                return invalid("count cannot be combined with date, start_date or end_date");
            }
            if count == 0 || count > MAX_COUNT {
                return Err(ApiError::InvalidParameter(format!(
                    "count must be between 1 and {MAX_COUNT}, got {count}"
                )));
            }
        }
        if self.date.is_some() && (self.start_date.is_some() || self.end_date.is_some()) {
            return invalid("date cannot be combined with start_date or end_date");
        }
        if self.end_date.is_some() && self.start_date.is_none() {
            return invalid("end_date requires start_date");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ApiError::InvalidParameter(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }

        let first = first_apod_date();
        for date in [self.date, self.start_date, self.end_date].into_iter().flatten() {
            if date < first {
                return Err(ApiError::InvalidParameter(format!(
                    "{date} is before the first APOD ({first})"
                )));
            }
        }
        Ok(())
    }

    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        let dates = [
            ("date", self.date),
            ("start_date", self.start_date),
            ("end_date", self.end_date),
        ];
        for (name, date) in dates {
            if let Some(date) = date {
                payload.insert(name.to_string(), date.format("%Y-%m-%d").to_string());
            }
        }
        if let Some(count) = self.count {
            payload.insert("count".to_string(), count.to_string());
        }
        if self.hd {
            payload.insert("hd".to_string(), "true".to_string());
        }
        if self.thumbs {
            payload.insert("thumbs".to_string(), "true".to_string());
        }
        payload
    }
}

/// APOD accessor bound to a client.
pub struct Apod<'a, T: Transport = UreqTransport> {
    client: &'a mut Client<T>,
}

impl<'a, T: Transport> Apod<'a, T> {
    pub fn new(client: &'a mut Client<T>) -> Self {
        Self { client }
    }

    pub fn url(&self) -> String {
        format!("{}{APOD_PATH}", self.client.base_url())
    }

    /// Validate `query`, send it, and return the raw JSON body.
    pub fn fetch(&mut self, query: &ApodQuery) -> ApiResult<Value> {
        query.validate()?;
        let url = self.url();
        self.client.get(&url, query.to_payload())
    }

    /// Today's picture.
    pub fn today(&mut self) -> ApiResult<Picture> {
        self.fetch_as(&ApodQuery::new())
    }

    pub fn on(&mut self, date: NaiveDate) -> ApiResult<Picture> {
        self.fetch_as(&ApodQuery::new().date(date))
    }

    /// Every picture from `start` to `end`, inclusive.
    pub fn range(&mut self, start: NaiveDate, end: NaiveDate) -> ApiResult<Vec<Picture>> {
        self.fetch_as(&ApodQuery::new().start_date(start).end_date(end))
    }

    /// `count` randomly chosen pictures.
    pub fn random(&mut self, count: u32) -> ApiResult<Vec<Picture>> {
        self.fetch_as(&ApodQuery::new().count(count))
    }

    fn fetch_as<R: DeserializeOwned>(&mut self, query: &ApodQuery) -> ApiResult<R> {
        let body = self.fetch(query)?;
        serde_json::from_value(body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{response, FakeTransport};
    use crate::config::ClientConfig;
    use crate::types::MediaType;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client(body: &str) -> Client<FakeTransport> {
        Client::with_transport(
            ClientConfig::new().api_key("ABC123").base_url("http://localhost:3000/"),
            FakeTransport::replying(response(200, "1000", "999", body)),
        )
    }

    const PICTURE: &str = r#"{
        "date": "2020-01-01",
        "explanation": "A galaxy.",
        "media_type": "image",
        "service_version": "v1",
        "title": "Galaxy",
        "url": "https://apod.nasa.gov/apod/image/2001/galaxy.jpg"
    }"#;

    #[test]
    fn empty_query_has_empty_payload() {
        let query = ApodQuery::new();
        assert!(query.validate().is_ok());
        assert!(query.to_payload().is_empty());
        assert!(!query.returns_list());
    }

    #[test]
    fn payload_formats_dates_and_flags() {
        let payload = ApodQuery::new()
            .start_date(ymd(2020, 1, 1))
            .end_date(ymd(2020, 1, 9))
            .hd(true)
            .thumbs(true)
            .to_payload();
        assert_eq!(payload["start_date"], "2020-01-01");
        assert_eq!(payload["end_date"], "2020-01-09");
        assert_eq!(payload["hd"], "true");
        assert_eq!(payload["thumbs"], "true");
        assert!(!payload.contains_key("date"));
        assert!(!payload.contains_key("count"));
    }

    #[test]
    fn count_excludes_dates() {
        let err = ApodQuery::new().count(3).date(ymd(2020, 1, 1)).validate().unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
        let err = ApodQuery::new().count(3).start_date(ymd(2020, 1, 1)).validate().unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[test]
    fn count_bounds() {
        assert!(ApodQuery::new().count(0).validate().is_err());
        assert!(ApodQuery::new().count(1).validate().is_ok());
        assert!(ApodQuery::new().count(MAX_COUNT).validate().is_ok());
        assert!(ApodQuery::new().count(MAX_COUNT + 1).validate().is_err());
    }

    #[test]
    fn date_excludes_range() {
        let query = ApodQuery::new().date(ymd(2020, 1, 1)).start_date(ymd(2020, 1, 1));
        assert!(query.validate().is_err());
    }

    #[test]
    fn end_requires_start_and_order() {
        assert!(ApodQuery::new().end_date(ymd(2020, 1, 1)).validate().is_err());
        let reversed = ApodQuery::new().start_date(ymd(2020, 2, 1)).end_date(ymd(2020, 1, 1));
        assert!(reversed.validate().is_err());
        let open = ApodQuery::new().start_date(ymd(2020, 1, 1));
        assert!(open.validate().is_ok());
        assert!(open.returns_list());
    }

    #[test]
    fn dates_before_archive_are_rejected() {
        assert!(ApodQuery::new().date(ymd(1995, 6, 15)).validate().is_err());
        assert!(ApodQuery::new().date(ymd(1995, 6, 16)).validate().is_ok());
    }

    #[test]
    fn url_uses_base_url() {
        let mut c = client("{}");
        assert_eq!(c.apod().url(), "http://localhost:3000/planetary/apod");
    }

    #[test]
    fn fetch_returns_raw_body_and_sends_payload() {
        let mut c = client(r#"{"date": "2020-01-01"}"#);
        let body = c.apod().fetch(&ApodQuery::new().date(ymd(2020, 1, 1)).hd(true)).unwrap();
        assert_eq!(body["date"], "2020-01-01");

        let requests = c.transport().requests.borrow();
        assert_eq!(requests[0].url, "http://localhost:3000/planetary/apod");
        assert_eq!(requests[0].query_param("api_key"), Some("ABC123"));
        assert_eq!(requests[0].query_param("date"), Some("2020-01-01"));
        assert_eq!(requests[0].query_param("hd"), Some("true"));
        drop(requests);
        assert_eq!(c.ratelimit_remaining(), Some(999));
    }

    #[test]
    fn invalid_query_sends_nothing() {
        let mut c = client("{}");
        let err = c.apod().random(0).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
        assert!(c.transport().requests.borrow().is_empty());
        assert_eq!(c.ratelimit_limit(), None);
    }

    #[test]
    fn on_parses_picture() {
        let mut c = client(PICTURE);
        let picture = c.apod().on(ymd(2020, 1, 1)).unwrap();
        assert_eq!(picture.title, "Galaxy");
        assert_eq!(picture.media_type, MediaType::Image);
    }

    #[test]
    fn random_parses_list() {
        let mut c = client(&format!("[{PICTURE},{PICTURE}]"));
        let pictures = c.apod().random(2).unwrap();
        assert_eq!(pictures.len(), 2);
        assert_eq!(c.transport().requests.borrow()[0].query_param("count"), Some("2"));
    }

    #[test]
    fn shape_mismatch_is_deserialization_error() {
        let mut c = client(PICTURE);
        let err = c.apod().random(2).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn error_body_surfaces_as_nasa_api_error() {
        let mut c = client(r#"{"error": "invalid date"}"#);
        let err = c.apod().today().unwrap_err();
        assert!(matches!(err, ApiError::NasaApi(ref m) if m == "invalid date"));
        assert_eq!(c.ratelimit_limit(), Some(1000));
    }
}
