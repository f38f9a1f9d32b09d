//! The prediction form: raw input, submit-time validation and the request
//! state machine.
//!
//! The form never performs I/O itself. `submit` hands back a `SubmitTicket`
//! describing the one request to make; whoever performs it reports back via
//! `resolve`, quoting the ticket's generation. Tickets from before the latest
//! `submit`/`reset` no longer match and are dropped, so a slow response can
//! never overwrite newer state.
//!
//! State transitions:
//!
//! ```text
//! Idle | Success | Failure --submit(invalid)--> Failure(Invalid)
//! Idle | Success | Failure --submit(valid)----> Pending
//! Pending --resolve(current, Ok)--------------> Success
//! Pending --resolve(current, Err)-------------> Failure(Request)
//! any --reset--------------------------------> Idle (form cleared)
//! ```

use crate::domain::{Failure, FeatureVector, FieldKey, FormState, Generation, SubmissionResult};
use crate::service::{PredictionService, RequestError};
use crate::validate::{Bound, ValidationError, validate_with_bound};

pub mod dispatch;

pub use dispatch::{Completion, Dispatcher};

/// One request the caller must perform on behalf of the form.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    pub generation: Generation,
    pub features: FeatureVector,
}

/// What `submit` decided.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Input is valid; perform this request.
    Dispatch(SubmitTicket),
    /// Input is invalid; the form now shows the error.
    Rejected(ValidationError),
    /// A request is already in flight; nothing changed.
    Busy,
}

#[derive(Debug, Clone)]
pub struct PredictionForm {
    state: FormState,
    result: SubmissionResult,
    generation: Generation,
    bound: Bound,
}

impl Default for PredictionForm {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionForm {
    pub fn new() -> Self {
        Self::with_bound(Bound::STANDARDIZED)
    }

    pub fn with_bound(bound: Bound) -> Self {
        Self {
            state: FormState::default(),
            result: SubmissionResult::Idle,
            generation: Generation::default(),
            bound,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn result(&self) -> &SubmissionResult {
        &self.result
    }

    pub fn value(&self, key: FieldKey) -> &str {
        self.state.get(key)
    }

    /// Generation of the most recently issued ticket (or reset).
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// False while a request is in flight; front ends disable their trigger.
    pub fn can_submit(&self) -> bool {
        !self.result.is_pending()
    }

    /// Store a raw value as typed. Clears a shown failure; a shown score stays.
    pub fn on_field_change(&mut self, key: FieldKey, raw: impl Into<String>) {
        self.state.set(key, raw);
        if matches!(self.result, SubmissionResult::Failure(_)) {
            self.result = SubmissionResult::Idle;
        }
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if self.result.is_pending() {
            tracing::debug!(generation = %self.generation, "submit ignored while pending");
            return SubmitOutcome::Busy;
        }

        match validate_with_bound(&self.state, self.bound) {
            Ok(features) => {
                self.generation = self.generation.next();
                self.result = SubmissionResult::Pending;
                tracing::info!(generation = %self.generation, "submitting prediction request");
                SubmitOutcome::Dispatch(SubmitTicket {
                    generation: self.generation,
                    features,
                })
            }
            Err(err) => {
                tracing::info!(error = %err, "submission rejected by validation");
                self.result = SubmissionResult::Failure(Failure::Invalid(err.clone()));
                SubmitOutcome::Rejected(err)
            }
        }
    }

    /// Apply the outcome of a ticket. Returns false if it was stale and ignored.
    pub fn resolve(&mut self, generation: Generation, outcome: Result<f64, RequestError>) -> bool {
        if generation != self.generation || !self.result.is_pending() {
            tracing::debug!(
                stale = %generation,
                current = %self.generation,
                "discarding stale prediction response"
            );
            return false;
        }

        self.result = match outcome {
            Ok(score) => {
                tracing::info!(%generation, score, "prediction received");
                SubmissionResult::Success(score)
            }
            Err(err) => {
                tracing::warn!(%generation, error = %err, "prediction request failed");
                SubmissionResult::Failure(Failure::Request)
            }
        };
        true
    }

    /// Clear every field and return to `Idle`. Any in-flight ticket goes stale.
    pub fn reset(&mut self) {
        self.state = FormState::default();
        self.result = SubmissionResult::Idle;
        self.generation = self.generation.next();
        tracing::debug!(generation = %self.generation, "form reset");
    }

    /// Submit and wait for the service in the current thread.
    pub fn submit_blocking(&mut self, service: &dyn PredictionService) -> &SubmissionResult {
        if let SubmitOutcome::Dispatch(ticket) = self.submit() {
            let outcome = service.predict(&ticket.features);
            self.resolve(ticket.generation, outcome);
        }
        &self.result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::REQUEST_FAILED_MESSAGE;

    pub(crate) const SCENARIO_A: [&str; 10] = [
        "0.05", "-0.04", "0.06", "0.02", "-0.04", "-0.03", "-0.04", "-0.00", "0.02", "-0.03",
    ];

    pub(crate) fn filled_form() -> PredictionForm {
        let mut form = PredictionForm::new();
        for (key, v) in FieldKey::ALL.into_iter().zip(SCENARIO_A) {
            form.on_field_change(key, v);
        }
        form
    }

    /// Service that answers every call with the same outcome.
    pub(crate) struct FixedService(pub Result<f64, RequestError>);

    impl PredictionService for FixedService {
        fn predict(&self, _: &FeatureVector) -> Result<f64, RequestError> {
            self.0.clone()
        }
    }

    fn ticket(outcome: SubmitOutcome) -> SubmitTicket {
        match outcome {
            SubmitOutcome::Dispatch(t) => t,
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn new_form_is_empty_and_idle() {
        let form = PredictionForm::new();
        assert!(form.state().is_blank());
        assert_eq!(form.result(), &SubmissionResult::Idle);
        assert!(form.can_submit());
    }

    #[test]
    fn invalid_submit_sets_failure_without_ticket() {
        let mut form = PredictionForm::new();
        form.on_field_change(FieldKey::Age, "0.1");
        let outcome = form.submit();
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(ValidationError::MissingFields(_))
        ));
        assert!(matches!(
            form.result(),
            SubmissionResult::Failure(Failure::Invalid(_))
        ));
        assert_eq!(form.generation(), Generation::default());
    }

    #[test]
    fn editing_clears_failure_but_keeps_success() {
        let mut form = PredictionForm::new();
        form.submit();
        assert!(form.result().failure().is_some());
        form.on_field_change(FieldKey::Bmi, "0.2");
        assert_eq!(form.result(), &SubmissionResult::Idle);
        assert_eq!(form.value(FieldKey::Bmi), "0.2");

        let mut form = filled_form();
        form.submit_blocking(&FixedService(Ok(120.0)));
        form.on_field_change(FieldKey::Bmi, "0.3");
        assert_eq!(form.result(), &SubmissionResult::Success(120.0));
    }

    #[test]
    fn valid_submit_goes_pending_with_features() {
        let mut form = filled_form();
        let t = ticket(form.submit());
        assert!(form.result().is_pending());
        assert!(!form.can_submit());
        assert_eq!(t.generation, form.generation());
        assert_eq!(t.features.bmi, 0.06);
        assert_eq!(t.features.s6, -0.03);
    }

    #[test]
    fn submit_while_pending_is_ignored() {
        let mut form = filled_form();
        let first = ticket(form.submit());
        assert_eq!(form.submit(), SubmitOutcome::Busy);
        assert_eq!(form.generation(), first.generation);
        assert!(form.resolve(first.generation, Ok(1.0)));
    }

    #[test]
    fn scenario_c_success_is_shown_rounded() {
        let mut form = filled_form();
        let t = ticket(form.submit());
        assert!(form.resolve(t.generation, Ok(152.3)));
        assert_eq!(form.result(), &SubmissionResult::Success(152.3));
        assert_eq!(form.result().to_string(), "Prediction: 152.30");
    }

    #[test]
    fn scenario_d_server_error_keeps_form() {
        let mut form = filled_form();
        let before = form.state().clone();
        let t = ticket(form.submit());
        assert!(form.resolve(t.generation, Err(RequestError::Status(500))));
        assert_eq!(form.result(), &SubmissionResult::Failure(Failure::Request));
        assert_eq!(form.result().to_string(), REQUEST_FAILED_MESSAGE);
        assert_eq!(form.state(), &before);
    }

    #[test]
    fn transport_and_decode_errors_collapse_to_same_failure() {
        for err in [
            RequestError::Transport("connection refused".into()),
            RequestError::Decode("expected value".into()),
        ] {
            let mut form = filled_form();
            let result = form.submit_blocking(&FixedService(Err(err))).clone();
            assert_eq!(result, SubmissionResult::Failure(Failure::Request));
        }
    }

    #[test]
    fn retry_after_failure_is_allowed() {
        let mut form = filled_form();
        form.submit_blocking(&FixedService(Err(RequestError::Status(503))));
        assert!(form.can_submit());
        let result = form.submit_blocking(&FixedService(Ok(99.0)));
        assert_eq!(result, &SubmissionResult::Success(99.0));
    }

    #[test]
    fn reset_is_idempotent_from_any_state() {
        let mut idle = PredictionForm::new();
        let mut pending = filled_form();
        pending.submit();
        let mut success = filled_form();
        success.submit_blocking(&FixedService(Ok(10.0)));
        let mut failed = PredictionForm::new();
        failed.submit();

        for form in [&mut idle, &mut pending, &mut success, &mut failed] {
            form.reset();
            form.reset();
            assert!(form.state().is_blank());
            assert_eq!(form.state(), &FormState::default());
            assert_eq!(form.result(), &SubmissionResult::Idle);
        }
    }

    #[test]
    fn reset_discards_in_flight_success_and_failure() {
        for outcome in [Ok(152.3), Err(RequestError::Status(500))] {
            let mut form = filled_form();
            let t = ticket(form.submit());
            form.reset();
            assert!(!form.resolve(t.generation, outcome));
            assert_eq!(form.result(), &SubmissionResult::Idle);
            assert!(form.state().is_blank());
        }
    }

    #[test]
    fn old_ticket_cannot_overwrite_newer_request() {
        let mut form = filled_form();
        let old = ticket(form.submit());
        form.reset();
        for (key, v) in FieldKey::ALL.into_iter().zip(SCENARIO_A) {
            form.on_field_change(key, v);
        }
        let new = ticket(form.submit());
        assert!(!form.resolve(old.generation, Ok(1.0)));
        assert!(form.result().is_pending());
        assert!(form.resolve(new.generation, Ok(2.0)));
        assert_eq!(form.result().score(), Some(2.0));
        assert!(!form.resolve(new.generation, Ok(3.0)));
        assert_eq!(form.result().score(), Some(2.0));
    }

    #[test]
    fn out_of_range_value_never_dispatches() {
        let mut form = filled_form();
        form.on_field_change(FieldKey::Bmi, "10");
        let outcome = form.submit();
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected(ValidationError::OutOfRange {
                field: FieldKey::Bmi,
                bound: Bound::STANDARDIZED,
            })
        );
        assert_eq!(form.result().to_string(), "BMI must be within [-4, 4]");
    }
}
