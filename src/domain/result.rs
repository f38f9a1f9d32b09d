//! Submission state: one tagged union instead of separate loading/result/error flags.

use std::fmt;

use crate::validate::ValidationError;

/// Message shown for any failed request. The cause is logged, not displayed.
pub const REQUEST_FAILED_MESSAGE: &str = "Prediction request failed. Please try again.";

/// Why the last submission did not produce a score.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// Rejected locally; nothing was sent.
    Invalid(ValidationError),
    /// The service could not be reached or answered with something unusable.
    Request,
}

impl Failure {
    pub fn message(&self) -> String {
        match self {
            Failure::Invalid(err) => err.to_string(),
            Failure::Request => REQUEST_FAILED_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionResult {
    #[default]
    Idle,
    Pending,
    Success(f64),
    Failure(Failure),
}

impl SubmissionResult {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionResult::Pending)
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            SubmissionResult::Success(score) => Some(*score),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            SubmissionResult::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionResult::Idle => Ok(()),
            SubmissionResult::Pending => f.write_str("Predicting..."),
            SubmissionResult::Success(score) => write!(f, "Prediction: {}", format_score(*score)),
            SubmissionResult::Failure(failure) => write!(f, "{failure}"),
        }
    }
}

/// Scores are shown to two decimal places.
pub fn format_score(score: f64) -> String {
    format!("{score:.2}")
}

/// Tag for an issued request. Only the newest tag may change the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Generation {
        Generation(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldKey;

    #[test]
    fn success_displays_two_decimals() {
        let shown = |score: f64| SubmissionResult::Success(score).to_string();
        assert_eq!(shown(152.3), "Prediction: 152.30");
        assert_eq!(shown(98.456), "Prediction: 98.46");
    }

    #[test]
    fn idle_renders_nothing_and_pending_renders_hint() {
        assert_eq!(SubmissionResult::Idle.to_string(), "");
        assert_eq!(SubmissionResult::Pending.to_string(), "Predicting...");
    }

    #[test]
    fn failures_render_their_message() {
        let req = SubmissionResult::Failure(Failure::Request);
        assert_eq!(req.to_string(), REQUEST_FAILED_MESSAGE);

        let invalid = Failure::Invalid(ValidationError::NotANumber(FieldKey::Bp));
        let shown = SubmissionResult::Failure(invalid).to_string();
        assert_eq!(shown, "Blood Pressure must be a number");
    }

    #[test]
    fn generation_increases() {
        let g = Generation::default();
        assert!(g.next() > g);
        assert_eq!(g.next().next().value(), 2);
    }
}
