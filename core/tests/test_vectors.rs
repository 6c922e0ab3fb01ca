//! Verify request building and response parsing against the JSON vectors in
//! `test-vectors/`.
//!
//! Each request vector maps an `ApodQuery` to the exact query string pairs.
//! Each response vector feeds a canned `HttpResponse` through
//! `Client::parse_response` and checks both the outcome and the rate-limit
//! fields left on the client.

use nasa_core::apod::APOD_PATH;
use nasa_core::{ApiError, ApodQuery, Client, ClientConfig, HttpResponse};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> Client {
    Client::with_config(ClientConfig::new().api_key("ABC123").base_url(BASE_URL))
}

fn vectors() -> Value {
    let raw = include_str!("../../test-vectors/apod.json");
    serde_json::from_str(raw).unwrap()
}

fn date(case: &Value, field: &str) -> Option<chrono::NaiveDate> {
    case[field].as_str().map(|s| s.parse().unwrap())
}

fn pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let arr = pair.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_vectors() {
    let vectors = vectors();
    let mut c = client();

    for case in vectors["requests"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let q = &case["query"];
        let query = ApodQuery {
            date: date(q, "date"),
            start_date: date(q, "start_date"),
            end_date: date(q, "end_date"),
            count: q["count"].as_u64().map(|n| n as u32),
            hd: q["hd"].as_bool().unwrap_or(false),
            thumbs: q["thumbs"].as_bool().unwrap_or(false),
        };
        query.validate().unwrap_or_else(|e| panic!("{name}: {e}"));

        let url = c.apod().url();
        assert_eq!(url, format!("{BASE_URL}{APOD_PATH}"), "{name}: url");

        let req = c.build_get(&url, query.to_payload());
        assert_eq!(req.query, pairs(&case["expected_query"]), "{name}: query");
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_vectors() {
    let vectors = vectors();

    for case in vectors["responses"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut c = client();
        let response = HttpResponse {
            status: case["status"].as_u64().unwrap() as u16,
            headers: pairs(&case["headers"]),
            body: case["body"].as_str().unwrap().to_string(),
        };

        let result = c.parse_response(response);
        let expected = &case["expected"];

        match (expected.get("ok"), result) {
            (Some(body), Ok(actual)) => assert_eq!(&actual, body, "{name}: body"),
            (Some(_), Err(e)) => panic!("{name}: expected success, got {e:?}"),
            (None, Ok(actual)) => panic!("{name}: expected error, got {actual}"),
            (None, Err(err)) => match (expected["error"].as_str().unwrap(), err) {
                ("rate_limited", ApiError::RateLimited) => {}
                ("nasa_api", ApiError::NasaApi(msg)) => {
                    assert_eq!(msg, expected["message"].as_str().unwrap(), "{name}: message");
                }
                ("http", ApiError::HttpError { status, .. }) => {
                    assert_eq!(u64::from(status), expected["status"].as_u64().unwrap(), "{name}: status");
                }
                ("deserialization", ApiError::Deserialization(_)) => {}
                (kind, other) => panic!("{name}: expected {kind}, got {other:?}"),
            },
        }

        assert_eq!(c.ratelimit_limit(), case["ratelimit_limit"].as_u64(), "{name}: limit");
        assert_eq!(c.ratelimit_remaining(), case["ratelimit_remaining"].as_u64(), "{name}: remaining");
    }
}
