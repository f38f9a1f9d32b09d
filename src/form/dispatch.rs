//! Runs prediction requests off the UI thread.
//!
//! Each ticket gets a short-lived worker thread that makes the blocking call
//! and sends a `Completion` back over a channel. The owner of the form drains
//! the channel from its own loop and feeds each completion to
//! `PredictionForm::resolve`, so the form is only ever touched by one thread.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::domain::Generation;
use crate::form::{PredictionForm, SubmitTicket};
use crate::service::{PredictionService, RequestError};

/// Result of one ticket, tagged with the generation it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub generation: Generation,
    pub outcome: Result<f64, RequestError>,
}

pub struct Dispatcher {
    service: Arc<dyn PredictionService>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn PredictionService>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { service, tx, rx }
    }

    /// Start the request described by `ticket`.
    pub fn dispatch(&self, ticket: SubmitTicket) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let generation = ticket.generation;

        let spawned = thread::Builder::new()
            .name(format!("prediction-{}", generation.value()))
            .spawn(move || {
                let outcome = service.predict(&ticket.features);
                // The receiver is gone once the dispatcher is dropped; nothing to deliver to.
                let _ = tx.send(Completion {
                    generation: ticket.generation,
                    outcome,
                });
            });

        if let Err(e) = spawned {
            tracing::error!(%generation, error = %e, "failed to start request thread");
            let _ = self.tx.send(Completion {
                generation,
                outcome: Err(RequestError::Transport(format!(
                    "failed to start request thread: {e}"
                ))),
            });
        }
    }

    /// Completions that have arrived so far, without waiting.
    pub fn drain(&self) -> Vec<Completion> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Completion> {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => Some(completion),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Feed all arrived completions to `form`. Returns how many changed it.
    pub fn apply(&self, form: &mut PredictionForm) -> usize {
        self.drain()
            .into_iter()
            .filter(|c| form.resolve(c.generation, c.outcome.clone()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, SubmissionResult};
    use crate::form::SubmitOutcome;
    use crate::form::tests::{FixedService, filled_form};
    use std::sync::Mutex;
    use std::sync::mpsc::SyncSender;

    const WAIT: Duration = Duration::from_secs(5);

    /// Blocks each call until the test releases it.
    struct GatedService {
        release: Mutex<Receiver<Result<f64, RequestError>>>,
    }

    impl GatedService {
        fn new() -> (Self, SyncSender<Result<f64, RequestError>>) {
            let (tx, rx) = mpsc::sync_channel(4);
            (
                Self {
                    release: Mutex::new(rx),
                },
                tx,
            )
        }
    }

    impl PredictionService for GatedService {
        fn predict(&self, _: &FeatureVector) -> Result<f64, RequestError> {
            let rx = self.release.lock().unwrap();
            rx.recv()
                .unwrap_or_else(|_| Err(RequestError::Transport("gate closed".into())))
        }
    }

    fn submit(form: &mut PredictionForm) -> SubmitTicket {
        match form.submit() {
            SubmitOutcome::Dispatch(t) => t,
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn completion_reaches_the_form() {
        let dispatcher = Dispatcher::new(Arc::new(FixedService(Ok(152.3))));
        let mut form = filled_form();
        dispatcher.dispatch(submit(&mut form));

        let c = dispatcher.recv_timeout(WAIT).expect("completion");
        assert_eq!(c.generation, form.generation());
        assert!(form.resolve(c.generation, c.outcome));
        assert_eq!(form.result(), &SubmissionResult::Success(152.3));
    }

    #[test]
    fn reset_while_in_flight_keeps_form_idle() {
        let (service, release) = GatedService::new();
        let dispatcher = Dispatcher::new(Arc::new(service));
        let mut form = filled_form();
        dispatcher.dispatch(submit(&mut form));

        form.reset();
        release.send(Ok(152.3)).unwrap();

        let c = dispatcher.recv_timeout(WAIT).expect("completion");
        assert!(!form.resolve(c.generation, c.outcome));
        assert_eq!(form.result(), &SubmissionResult::Idle);
        assert!(form.state().is_blank());
    }

    #[test]
    fn apply_counts_only_current_completions() {
        let (service, release) = GatedService::new();
        let dispatcher = Dispatcher::new(Arc::new(service));
        let mut form = filled_form();

        dispatcher.dispatch(submit(&mut form));
        form.reset();
        for (key, v) in crate::domain::FieldKey::ALL
            .into_iter()
            .zip(crate::form::tests::SCENARIO_A)
        {
            form.on_field_change(key, v);
        }
        dispatcher.dispatch(submit(&mut form));

        release.send(Err(RequestError::Status(500))).unwrap();
        release.send(Ok(42.0)).unwrap();

        let mut applied = 0;
        let mut seen = 0;
        while seen < 2 {
            let c = dispatcher.recv_timeout(WAIT).expect("completion");
            seen += 1;
            if form.resolve(c.generation, c.outcome) {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
        assert!(!form.result().is_pending());
        assert_eq!(dispatcher.apply(&mut form), 0);
    }

    #[test]
    fn drain_is_empty_without_requests() {
        let dispatcher = Dispatcher::new(Arc::new(FixedService(Ok(1.0))));
        assert!(dispatcher.drain().is_empty());
        assert!(dispatcher.recv_timeout(Duration::from_millis(10)).is_none());
    }
}
