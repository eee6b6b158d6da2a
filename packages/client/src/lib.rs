#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the Lemobar `area/near` endpoint.
//!
//! One GET per coordinate, no pagination, no retries. The endpoint expects
//! the headers captured from the WeChat mini-program verbatim, plus a
//! caller-supplied `Authorization` token; everything else about the request
//! is fixed. Retry policy belongs to the caller; in this tool a failed
//! point is logged and skipped, so the client stays single-shot.
//!
//! The [`AreaFetcher`] trait is the seam between the scan worker and the
//! network; tests substitute an in-memory implementation.

use std::time::Duration;

use lemoscan_models::{ApiEnvelope, Area};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Base URL of the `area/near` endpoint. `current`/`size`/`type` are fixed;
/// only the coordinate varies per request.
const API_BASE: &str = "https://toc.lemobar.com/api-toc/api/area/near";

/// Request timeout. Slow responses count as failed points.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Headers the mini-program sends on every request, replayed verbatim.
const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("content-type", "application/x-www-form-urlencoded"),
    ("Cache-Control", "no-cache"),
    ("p", "202507"),
    ("lan", "zh-Hans"),
    ("x-session-id", "31751347839278791807"),
    ("charset", "utf-8"),
    (
        "Referer",
        "https://servicewechat.com/wxadc480e27684767a/446/page-frame.html",
    ),
    (
        "User-Agent",
        "Mozilla/5.0 (Linux; Android 11; Pixel 3a...) Weixin NetType/WIFI \
         Language/zh_CN ABI/arm64 MiniProgramEnv/android",
    ),
    ("Accept-Encoding", "gzip, deflate, br"),
];

/// Errors that can occur while fetching areas.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure, including the 8-second timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected envelope, or carried a
    /// non-200 application code.
    #[error("Decode error: {0}")]
    Decode(String),

    /// No authorization token is configured.
    #[error("authorization token is not set")]
    MissingAuthorization,

    /// A header name or value could not be constructed.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

/// Trait for fetching the areas near a coordinate.
///
/// The scan worker is generic over this trait so the network can be mocked
/// out in tests.
pub trait AreaFetcher: Send + Sync {
    /// Fetches the areas near `(lng, lat)`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request or response decoding fails.
    fn fetch_near(
        &self,
        lng: f64,
        lat: f64,
    ) -> impl std::future::Future<Output = Result<Vec<Area>, ClientError>> + Send;
}

/// Builds the request URL for a coordinate. Longitude is substituted first;
/// the endpoint cares about the parameter order of its query string.
#[must_use]
pub fn near_url(lng: f64, lat: f64) -> String {
    format!("{API_BASE}?current=1&size=20&longitude={lng}&latitude={lat}&type=0")
}

/// Reqwest-backed [`AreaFetcher`] for the live Lemobar API.
#[derive(Debug, Clone)]
pub struct LemobarApi {
    client: reqwest::Client,
}

impl LemobarApi {
    /// Creates a client with the fixed mini-program headers plus the given
    /// `Authorization` token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingAuthorization`] if the token is empty,
    /// [`ClientError::InvalidHeader`] if it is not a valid header value, or
    /// [`ClientError::Http`] if the underlying client cannot be built.
    pub fn new(authorization: &str) -> Result<Self, ClientError> {
        if authorization.trim().is_empty() {
            return Err(ClientError::MissingAuthorization);
        }

        let mut headers = HeaderMap::new();
        for (key, value) in DEFAULT_HEADERS {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ClientError::InvalidHeader(format!("'{key}': {e}")))?;
            let val = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidHeader(format!("'{key}': {e}")))?;
            headers.insert(name, val);
        }
        let auth = HeaderValue::from_str(authorization)
            .map_err(|e| ClientError::InvalidHeader(format!("'Authorization': {e}")))?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }
}

impl AreaFetcher for LemobarApi {
    async fn fetch_near(&self, lng: f64, lat: f64) -> Result<Vec<Area>, ClientError> {
        let url = near_url(lng, lat);
        log::debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        if envelope.code != 200 {
            return Err(ClientError::Decode(format!(
                "API returned code {}",
                envelope.code
            )));
        }

        Ok(envelope.data.records)
    }
}
