//! The remote prediction service, as seen from the form.
//!
//! - `PredictionService`: the seam the form and dispatcher call through
//! - `HttpPredictionClient`: the real implementation over HTTP (`client`)

use crate::domain::FeatureVector;

pub mod client;

pub use client::*;

/// Anything that can turn a validated feature vector into a score.
///
/// Calls block; the dispatcher moves them off the UI thread.
pub trait PredictionService: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RequestError>;
}

/// Why a prediction request produced no score.
///
/// The user only ever sees one generic message; these details go to the log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("request could not be completed: {0}")]
    Transport(String),
    #[error("service answered with HTTP {0}")]
    Status(u16),
    #[error("response could not be read: {0}")]
    Decode(String),
}
