use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEMO_KEY: &str = "DEMO_KEY";
pub const DEFAULT_LIMIT: u64 = 1000;
pub const DEMO_LIMIT: u64 = 30;
pub const MAX_COUNT: u32 = 100;

pub fn first_apod_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 6, 16).unwrap_or(NaiveDate::MIN)
}

/// Raw query string. Everything stays a string so malformed values can be
/// answered with the endpoint's own 400 body instead of axum's rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ApodParams {
    pub api_key: Option<String>,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub count: Option<String>,
    pub hd: Option<String>,
    pub thumbs: Option<String>,
}

/// Requests used per key, counted against `limit` (or `demo_limit`).
#[derive(Clone)]
pub struct AppState {
    pub limit: u64,
    pub demo_limit: u64,
    pub today: NaiveDate,
    usage: Arc<RwLock<HashMap<String, u64>>>,
}

impl AppState {
    pub fn new(limit: u64, demo_limit: u64, today: NaiveDate) -> Self {
        Self {
            limit,
            demo_limit,
            today,
            usage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn limit_for(&self, key: &str) -> u64 {
        if key == DEMO_KEY {
            self.demo_limit
        } else {
            self.limit
        }
    }

    /// Count one request for `key`. Returns the remaining quota, or `None`
    /// once it is exhausted.
    async fn consume(&self, key: &str) -> Option<u64> {
        let limit = self.limit_for(key);
        let mut usage = self.usage.write().await;
        let used = usage.entry(key.to_string()).or_insert(0);
        if *used >= limit {
            return None;
        }
        *used += 1;
        Some(limit - *used)
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new(DEFAULT_LIMIT, DEMO_LIMIT, Utc::now().date_naive()))
}

pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/planetary/apod", get(apod))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn apod(State(state): State<AppState>, Query(params): Query<ApodParams>) -> Response {
    let Some(key) = params.api_key.as_deref().filter(|k| !k.is_empty()) else {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {
                "code": "API_KEY_MISSING",
                "message": "No api_key was supplied. Get one at https://api.nasa.gov:443"
            }})),
        )
            .into_response();
    };

    let limit = state.limit_for(key);
    let Some(remaining) = state.consume(key).await else {
        tracing::debug!(limit, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            rate_limit_headers(limit, 0),
            Json(json!({"error": {
                "code": "OVER_RATE_LIMIT",
                "message": "You have exceeded your rate limit. Try again later."
            }})),
        )
            .into_response();
    };
    let headers = rate_limit_headers(limit, remaining);

    match resolve(&params, state.today) {
        Ok(body) => (StatusCode::OK, headers, Json(body)).into_response(),
        Err(ApodFailure::BadRequest(msg)) => (
            StatusCode::BAD_REQUEST,
            headers,
            Json(json!({"code": 400, "msg": msg, "service_version": "v1"})),
        )
            .into_response(),
        Err(ApodFailure::OutOfRange(msg)) => {
            (StatusCode::OK, headers, Json(json!({ "error": msg }))).into_response()
        }
    }
}

fn rate_limit_headers(limit: u64, remaining: u64) -> [(&'static str, String); 2] {
    [
        ("x-ratelimit-limit", limit.to_string()),
        ("x-ratelimit-remaining", remaining.to_string()),
    ]
}

#[derive(Debug, PartialEq, Eq)]
pub enum ApodFailure {
    /// Answered with 400 and `{"code": 400, "msg": ...}`.
    BadRequest(String),
    /// Answered with 200 and `{"error": ...}`.
    OutOfRange(String),
}

/// Turn query parameters into the response body.
pub fn resolve(params: &ApodParams, today: NaiveDate) -> Result<Value, ApodFailure> {
    let hd = flag(&params.hd);
    let thumbs = flag(&params.thumbs);
    let date = parse_date(&params.date, today)?;
    let start = parse_date(&params.start_date, today)?;
    let end = parse_date(&params.end_date, today)?;

    if let Some(raw) = &params.count {
        if date.is_some() || start.is_some() || end.is_some() {
            return Err(ApodFailure::BadRequest(
                "Bad Request: invalid field combination passed. Allowed request fields for count method are 'count', 'hd', 'thumbs'".into(),
            ));
        }
        let count: u32 = raw
            .parse()
            .map_err(|_| ApodFailure::BadRequest(format!("invalid literal for count: '{raw}'")))?;
        if count == 0 || count > MAX_COUNT {
            return Err(ApodFailure::BadRequest(format!(
                "Count must be positive and cannot exceed {MAX_COUNT}"
            )));
        }
        let pictures = (0..u64::from(count))
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .map(|d| picture(d, hd, thumbs))
            .collect();
        return Ok(Value::Array(pictures));
    }

    if let Some(start) = start {
        if date.is_some() {
            return Err(ApodFailure::BadRequest(
                "Bad Request: invalid field combination passed. Allowed request fields for start_date method are 'start_date', 'end_date', 'hd', 'thumbs'".into(),
            ));
        }
        let end = end.unwrap_or(today);
        if start > end {
            return Err(ApodFailure::BadRequest(
                "start_date cannot be later than end_date".into(),
            ));
        }
        let pictures = start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| picture(d, hd, thumbs))
            .collect();
        return Ok(Value::Array(pictures));
    }

    if end.is_some() {
        return Err(ApodFailure::BadRequest(
            "Bad Request: end_date requires start_date".into(),
        ));
    }
    Ok(picture(date.unwrap_or(today), hd, thumbs))
}

fn flag(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("true" | "True" | "1"))
}

fn parse_date(value: &Option<String>, today: NaiveDate) -> Result<Option<NaiveDate>, ApodFailure> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApodFailure::BadRequest(format!("time data '{raw}' does not match format '%Y-%m-%d'"))
    })?;
    let first = first_apod_date();
    if date < first || date > today {
        return Err(ApodFailure::OutOfRange(format!(
            "Date must be between {} and {}.",
            first.format("%b %d, %Y"),
            today.format("%b %d, %Y")
        )));
    }
    Ok(Some(date))
}

/// Deterministic entry for `date`. Every seventh day of the year is a video.
pub fn picture(date: NaiveDate, hd: bool, thumbs: bool) -> Value {
    use chrono::Datelike;

    let stamp = date.format("%y%m%d");
    let is_video = date.ordinal() % 7 == 0;
    let mut body = json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "title": format!("Mock APOD {date}"),
        "explanation": format!("Deterministic mock entry for {date}."),
        "media_type": if is_video { "video" } else { "image" },
        "service_version": "v1",
    });
    if is_video {
        body["url"] = json!(format!("https://www.youtube.com/embed/mock{stamp}"));
        if thumbs {
            body["thumbnail_url"] = json!(format!("https://img.youtube.com/vi/mock{stamp}/0.jpg"));
        }
    } else {
        body["url"] = json!(format!("https://apod.nasa.gov/apod/image/ap{stamp}.jpg"));
        if hd {
            body["hdurl"] = json!(format!("https://apod.nasa.gov/apod/image/ap{stamp}_big.jpg"));
        }
    }
    body
}
