//! `diabetes-form` library crate.
//!
//! The binary (`dpf`) is a thin wrapper around this library so that:
//!
//! - the form state machine is testable without a terminal or a network
//! - the HTTP client can be swapped for a fake behind `PredictionService`
//! - front ends (terminal form, one-shot CLI) share one controller

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod form;
pub mod logging;
pub mod service;
pub mod tui;
pub mod validate;
