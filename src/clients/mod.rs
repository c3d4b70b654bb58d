/// External API clients module
use crate::domain::{TrainService, ANY_DESTINATION, SENTINEL_KEY, UNKNOWN_PLATFORM};
use crate::errors::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper with common configuration
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quick-train-times/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// Build `?name=value&name=value` from parallel lists.
pub fn format_params(names: &[&str], values: &[String]) -> ApiResult<String> {
    if names.len() != values.len() {
        return Err(ApiError::InvalidInput(
            "not same number of parameter names and values".to_string(),
        ));
    }

    let query = names
        .iter()
        .zip(values)
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");

    if query.is_empty() {
        Ok(query)
    } else {
        Ok(format!("?{}", query))
    }
}

/// Query string for a board from one station, optionally filtered by
/// destination.
pub fn departure_params(dest: &str, rows: usize) -> ApiResult<String> {
    if dest == ANY_DESTINATION {
        format_params(&["numRows"], &[rows.to_string()])
    } else {
        format_params(
            &["filterCrs", "filterType", "numRows"],
            &[dest.to_string(), "to".to_string(), rows.to_string()],
        )
    }
}

#[derive(Debug, Deserialize)]
struct BoardResponse {
    #[serde(rename = "trainServices", default)]
    train_services: Option<Vec<RawService>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawService {
    #[serde(default)]
    platform: Option<String>,
    std: String,
    etd: String,
    operator: String,
    operator_code: String,
    destination: Vec<RawLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocation {
    crs: String,
    location_name: String,
}

/// Decode a departure board body into service rows.
pub fn parse_board(body: &str) -> ApiResult<Vec<TrainService>> {
    let board: BoardResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    board
        .train_services
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| -> ApiResult<TrainService> {
            let dest = raw.destination.into_iter().next().ok_or_else(|| {
                ApiError::Decode(format!("service {} has no destination", idx))
            })?;
            Ok(TrainService {
                std: raw.std,
                etd: raw.etd,
                platform: raw
                    .platform
                    .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string()),
                dest_crs: dest.crs,
                dest_name: dest.location_name,
                operator: raw.operator,
                operator_code: raw.operator_code,
            })
        })
        .collect()
}

/// Anything that can produce a departure board for a station
#[async_trait]
pub trait DepartureSource: Send + Sync {
    async fn fetch_departures(
        &self,
        org: &str,
        params: &str,
        key: &str,
    ) -> ApiResult<Vec<TrainService>>;
}

/// Live Departure Boards client
pub struct LdbClient {
    http_client: HttpClient,
    base_url: String,
}

impl LdbClient {
    pub fn new(base_url: String, timeout: Duration) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(timeout)?,
            base_url,
        })
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DepartureSource for LdbClient {
    async fn fetch_departures(
        &self,
        org: &str,
        params: &str,
        key: &str,
    ) -> ApiResult<Vec<TrainService>> {
        if key == SENTINEL_KEY {
            debug!("Placeholder API key, skipping request for {}", org);
            return Ok(Vec::new());
        }

        let url = format!("{}{}{}", self.base_url, org.trim().to_uppercase(), params);
        debug!("GET {}", url);

        let resp = self
            .http_client
            .get_client()
            .get(&url)
            .header("x-apikey", key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::UpstreamStatus(status.as_u16()));
        }

        let body = resp.text().await?;
        parse_board(&body)
    }
}
