//! Application-level error carried up to `main`.
//!
//! Component errors (`ValidationError`, `RequestError`) are typed and handled by
//! the form. `AppError` is what's left once a failure should end the process:
//! a message for stderr plus the exit code.

/// Validation rejected the input (one-shot mode).
pub const EXIT_INVALID_INPUT: u8 = 1;
/// Bad configuration or arguments.
pub const EXIT_CONFIG: u8 = 2;
/// The prediction service failed or was unreachable.
pub const EXIT_SERVICE: u8 = 3;
/// Terminal or other local I/O failure.
pub const EXIT_IO: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EXIT_IO, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
