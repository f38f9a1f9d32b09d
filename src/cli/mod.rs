//! Command-line parsing for the prediction form.
//!
//! Parsing stays separate from the form logic; `app` turns these structs into
//! settings and a filled-in `PredictionForm`.

use clap::{Args, Parser, Subcommand};

use crate::config::Overrides;
use crate::domain::{FieldKey, FormState};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "dpf",
    version,
    about = "Diabetes progression prediction form and service client"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive form (the default when no subcommand is given).
    Tui(ServiceArgs),
    /// Validate ten values, submit them once and print the prediction.
    Predict(PredictArgs),
    /// Check that the prediction service is reachable.
    Health(ServiceArgs),
}

/// Where to find the prediction service.
#[derive(Debug, Args, Clone, Default)]
pub struct ServiceArgs {
    /// Prediction endpoint URL (overrides PREDICTION_URL).
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Request timeout in seconds (overrides PREDICTION_TIMEOUT_SECS).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ServiceArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            timeout_secs: self.timeout,
        }
    }
}

/// One-shot prediction input.
///
/// Values are passed through as text so they go through the same validation
/// as the interactive form; an omitted field is reported as missing.
#[derive(Debug, Args, Clone, Default)]
pub struct PredictArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Print the response as JSON instead of a sentence.
    #[arg(long)]
    pub json: bool,

    /// Age (standardized).
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub age: String,
    /// Sex (standardized).
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub sex: String,
    /// Body mass index (standardized).
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub bmi: String,
    /// Average blood pressure (standardized).
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub bp: String,
    /// Total serum cholesterol.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub s1: String,
    /// Low-density lipoproteins.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub s2: String,
    /// High-density lipoproteins.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub s3: String,
    /// Total cholesterol / HDL.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub s4: String,
    /// Log of serum triglycerides level.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub s5: String,
    /// Blood sugar level.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub s6: String,
}

impl PredictArgs {
    pub fn raw(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::Age => &self.age,
            FieldKey::Sex => &self.sex,
            FieldKey::Bmi => &self.bmi,
            FieldKey::Bp => &self.bp,
            FieldKey::S1 => &self.s1,
            FieldKey::S2 => &self.s2,
            FieldKey::S3 => &self.s3,
            FieldKey::S4 => &self.s4,
            FieldKey::S5 => &self.s5,
            FieldKey::S6 => &self.s6,
        }
    }

    pub fn form_state(&self) -> FormState {
        let mut state = FormState::default();
        for key in FieldKey::ALL {
            state.set(key, self.raw(key));
        }
        state
    }
}
