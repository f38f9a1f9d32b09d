//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves settings and sets up logging
//! - runs the interactive form, a one-shot prediction, or a health check

use clap::Parser;
use reqwest::Url;

use crate::cli::{Command, PredictArgs, ServiceArgs};
use crate::config::Settings;
use crate::domain::{Failure, REQUEST_FAILED_MESSAGE, SubmissionResult};
use crate::error::{AppError, EXIT_INVALID_INPUT, EXIT_SERVICE};
use crate::form::{PredictionForm, SubmitOutcome};
use crate::logging::{self, LogTarget};
use crate::service::{HttpPredictionClient, PredictionResponse, RequestError};

/// Entry point for the `dpf` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Predict(args) => handle_predict(args),
        Command::Health(args) => handle_health(args),
    }
}

fn handle_tui(args: ServiceArgs) -> Result<(), AppError> {
    let settings = Settings::resolve(&args.overrides())?;
    let log_path = logging::log_file_path(|key| std::env::var(key).ok());
    if let Err(e) = logging::init(LogTarget::File(log_path)) {
        eprintln!("warning: {e}");
    }
    tracing::info!(endpoint = %settings.endpoint, "starting interactive form");
    crate::tui::run(&settings)
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    init_stderr_logging();
    let settings = Settings::resolve(&args.service.overrides())?;
    let client = HttpPredictionClient::new(&settings)?;

    let mut form = PredictionForm::new();
    for (key, raw) in args.form_state().iter() {
        form.on_field_change(key, raw);
    }

    let mut response = None;
    if let SubmitOutcome::Dispatch(ticket) = form.submit() {
        let reply = client.request(&ticket.features);
        form.resolve(ticket.generation, reply.clone().map(|r| r.prediction));
        response = reply.ok();
    }

    let line = predict_output(form.result(), response.as_ref(), args.json)?;
    println!("{line}");
    Ok(())
}

/// What a one-shot prediction prints, or the error it exits with.
fn predict_output(
    result: &SubmissionResult,
    response: Option<&PredictionResponse>,
    json: bool,
) -> Result<String, AppError> {
    match result {
        SubmissionResult::Success(score) => {
            if !json {
                return Ok(result.to_string());
            }
            let body = match response {
                Some(response) => serde_json::to_string(response),
                None => serde_json::to_string(&serde_json::json!({ "prediction": score })),
            };
            body.map_err(|e| AppError::io(format!("Failed to encode response: {e}")))
        }
        SubmissionResult::Failure(Failure::Invalid(err)) => {
            Err(AppError::new(EXIT_INVALID_INPUT, err.to_string()))
        }
        SubmissionResult::Failure(Failure::Request) => {
            Err(AppError::new(EXIT_SERVICE, REQUEST_FAILED_MESSAGE))
        }
        SubmissionResult::Idle | SubmissionResult::Pending => Err(AppError::new(
            EXIT_SERVICE,
            "Prediction did not complete.",
        )),
    }
}

fn handle_health(args: ServiceArgs) -> Result<(), AppError> {
    init_stderr_logging();
    let settings = Settings::resolve(&args.overrides())?;
    let client = HttpPredictionClient::new(&settings)?;

    let line = health_output(client.endpoint(), client.health())?;
    println!("{line}");
    Ok(())
}

/// Map a health check to the line to print, or exit 3 when the service is down.
fn health_output(endpoint: &Url, reply: Result<String, RequestError>) -> Result<String, AppError> {
    match reply {
        Ok(reply) => Ok(format!("Prediction service at {endpoint} is up: {reply}")),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            Err(AppError::new(
                EXIT_SERVICE,
                format!("Prediction service at {endpoint} is unavailable: {err}"),
            ))
        }
    }
}

fn init_stderr_logging() {
    if let Err(e) = logging::init(LogTarget::Stderr) {
        eprintln!("warning: {e}");
    }
}

/// Rewrite argv so `dpf` defaults to `dpf tui`.
///
/// Rules:
/// - `dpf`                      -> `dpf tui`
/// - `dpf --url URL ...`        -> `dpf tui --url URL ...`
/// - `dpf --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "predict" | "health");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
