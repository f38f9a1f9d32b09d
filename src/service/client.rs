//! HTTP client for the prediction endpoint.

use std::net::IpAddr;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Settings;
use crate::domain::FeatureVector;
use crate::error::AppError;
use crate::service::{PredictionService, RequestError};

/// Body of a successful `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: f64,
    /// Any other keys the service sent, kept so the body can be echoed whole.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct HttpPredictionClient {
    client: Client,
    endpoint: Url,
}

impl HttpPredictionClient {
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let mut builder = Client::builder().timeout(settings.timeout);
        // A local service is never reached through a proxy.
        if is_loopback(&settings.endpoint) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Ask the service root whether it is up. Returns its (trimmed) reply text.
    pub fn health(&self) -> Result<String, RequestError> {
        let url = root_url(&self.endpoint);
        tracing::debug!(%url, "health check");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| RequestError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(RequestError::Status(resp.status().as_u16()));
        }
        let text = resp
            .text()
            .map_err(|e| RequestError::Decode(e.to_string()))?;
        Ok(text.trim().to_string())
    }

    /// POST the features and return the full decoded response.
    pub fn request(&self, features: &FeatureVector) -> Result<PredictionResponse, RequestError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(features)
            .send()
            .map_err(|e| RequestError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RequestError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .map_err(|e| RequestError::Transport(e.to_string()))?;
        parse_response(&body)
    }
}

impl PredictionService for HttpPredictionClient {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RequestError> {
        self.request(features).map(|r| r.prediction)
    }
}

/// Decode a response body, requiring a finite numeric `prediction`.
pub fn parse_response(body: &str) -> Result<PredictionResponse, RequestError> {
    let parsed: PredictionResponse =
        serde_json::from_str(body).map_err(|e| RequestError::Decode(e.to_string()))?;
    if !parsed.prediction.is_finite() {
        return Err(RequestError::Decode("prediction is not finite".to_string()));
    }
    Ok(parsed)
}

/// The service's liveness route sits at the root of the endpoint's origin.
fn root_url(endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    url
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}
