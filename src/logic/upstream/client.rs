//! Prediction Service Client
//!
//! HTTP client for the simulate/predict/check-hardware and equipment endpoints. Every call
//! is a single request: no retries, and a failure never touches stored state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logic::snapshot::{PredictionResult, SimulationInput, Snapshot};

/// Prediction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        use crate::constants;

        Self {
            base_url: constants::get_upstream_url(),
            timeout_seconds: constants::get_http_timeout(),
        }
    }
}

/// Sensor status entry, display only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareStatus {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl HardwareStatus {
    pub fn is_active(&self) -> bool {
        match (self.active, self.status.as_deref()) {
            (Some(active), _) => active,
            (None, Some(status)) => matches!(
                status.to_lowercase().as_str(),
                "active" | "connected" | "online"
            ),
            (None, None) => false,
        }
    }

    pub fn status_label(&self) -> String {
        match &self.status {
            Some(s) => s.clone(),
            None if self.is_active() => "Active".to_string(),
            None => "Inactive".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HardwareResponse {
    List(Vec<HardwareStatus>),
    Wrapped { details: Vec<HardwareStatus> },
}

/// Monitored piece of equipment (valve, pump, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: i64,
    pub name: String,
}

/// Latest failure diagnosis for one component, display only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub status: String,
    pub last_checked: String,
    pub cause: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Please enter all the values (missing: {})", .0.join(", "))]
    IncompleteInput(Vec<String>),

    #[error("Client setup failed: {0}")]
    Client(String),
}

/// Prediction service client
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    config: UpstreamConfig,
    http_client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Ask the service to generate readings and classify them
    pub async fn simulate(&self) -> Result<Snapshot, UpstreamError> {
        let url = format!("{}/simulate/", self.base_url());

        let response = self.http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Server(response.status().as_u16()));
        }

        response.json().await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }

    /// Classify operator-entered readings
    pub async fn predict(&self, input: SimulationInput) -> Result<Snapshot, UpstreamError> {
        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(UpstreamError::IncompleteInput(
                missing.into_iter().map(String::from).collect(),
            ));
        }

        let url = format!("{}/predict/", self.base_url());

        let response = self.http_client
            .post(&url)
            .json(&input)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Server(response.status().as_u16()));
        }

        let body: Value = response.json().await
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        snapshot_from_predict(input, body)
    }

    pub async fn check_hardware(&self) -> Result<Vec<HardwareStatus>, UpstreamError> {
        let url = format!("{}/check-hardware/", self.base_url());

        let response = self.http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Server(response.status().as_u16()));
        }

        let body: Value = response.json().await
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        parse_hardware(body)
    }

    /// Equipment list for failure diagnosis
    pub async fn components(&self) -> Result<Vec<Component>, UpstreamError> {
        let url = format!("{}/api/components", self.base_url());
        self.get_json(&url).await
    }

    pub async fn component_failure(&self, id: i64) -> Result<FailureDetail, UpstreamError> {
        let url = format!("{}/api/components/{}/failure", self.base_url(), id);
        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let response = self.http_client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Server(response.status().as_u16()));
        }

        response.json().await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}

/// Pair the submitted input with the predict response.
///
/// Accepts a bare result (`{prediction, details}`) or a full snapshot.
pub fn snapshot_from_predict(input: SimulationInput, body: Value) -> Result<Snapshot, UpstreamError> {
    if body.get("result").is_some() {
        let mut snap: Snapshot = serde_json::from_value(body)
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;
        if snap.simulation_input.is_none() {
            snap.simulation_input = Some(input);
        }
        return Ok(snap);
    }

    let result: PredictionResult = serde_json::from_value(body)
        .map_err(|e| UpstreamError::Parse(e.to_string()))?;
    Ok(Snapshot::new(input, result))
}

pub fn parse_hardware(body: Value) -> Result<Vec<HardwareStatus>, UpstreamError> {
    match serde_json::from_value(body) {
        Ok(HardwareResponse::List(list)) => Ok(list),
        Ok(HardwareResponse::Wrapped { details }) => Ok(details),
        Err(e) => Err(UpstreamError::Parse(e.to_string())),
    }
}
