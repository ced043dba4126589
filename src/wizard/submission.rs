//! Submission lifecycle: idle -> submitting -> success | error, with retry.
//!
//! The machine owns its timer ids but not the timer queue; the wizard passes
//! the queue in so every timer of one wizard lives in one place and can be
//! cleared together.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::store::FieldStore;
use super::timer::{TimerId, TimerQueue};

pub const PROGRESS_COMPLETE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success,
    Error,
}

/// Timers started by the submission machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardTimer {
    Progress,
    Completion,
    Redirect,
}

/// Everything the backend receives.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    pub form: String,
    pub attempt: u32,
    pub submitted_at: DateTime<Utc>,
    pub fields: FieldStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub reference: Uuid,
    pub accepted_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    pub fn issue() -> Self {
        Self {
            reference: Uuid::new_v4(),
            accepted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("submission failed: {message}")]
pub struct SubmissionFailure {
    pub message: String,
}

impl SubmissionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Resolves a submission. Production code performs the network call here;
/// the state machine only sees the result.
pub trait SubmissionBackend {
    fn resolve(&mut self, payload: &SubmissionPayload)
        -> Result<SubmissionReceipt, SubmissionFailure>;
}

/// Stand-in backend that succeeds with a fixed probability.
pub struct SimulatedBackend {
    rng: StdRng,
    success_ratio: f64,
}

impl SimulatedBackend {
    pub fn new(success_ratio: f64, seed: Option<u64>) -> Self {
        Self {
            rng: seeded_rng(seed),
            success_ratio: success_ratio.clamp(0.0, 1.0),
        }
    }
}

impl SubmissionBackend for SimulatedBackend {
    fn resolve(
        &mut self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionFailure> {
        if self.rng.random_bool(self.success_ratio) {
            Ok(SubmissionReceipt::issue())
        } else {
            tracing::debug!(form = %payload.form, attempt = payload.attempt, "simulated failure");
            Err(SubmissionFailure::new(
                "There was an error submitting your registration. Please try again.",
            ))
        }
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Delays and step sizes for one submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmissionTiming {
    pub progress_tick: Duration,
    pub max_progress_step: f64,
    pub completion_delay: Duration,
    pub redirect_delay: Duration,
}

impl Default for SubmissionTiming {
    fn default() -> Self {
        Self {
            progress_tick: Duration::from_millis(300),
            max_progress_step: 15.0,
            completion_delay: Duration::from_millis(3000),
            redirect_delay: Duration::from_millis(3000),
        }
    }
}

/// Upload progress in percent. Never decreases, never exceeds 100.
#[derive(Debug, Clone)]
pub struct ProgressMeter {
    value: f64,
    max_step: f64,
    rng: StdRng,
}

impl ProgressMeter {
    pub fn new(max_step: f64, seed: Option<u64>) -> Self {
        Self {
            value: 0.0,
            max_step: max_step.max(0.0),
            rng: seeded_rng(seed),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn tick(&mut self) -> f64 {
        let step = if self.max_step > 0.0 {
            self.rng.random_range(0.0..self.max_step)
        } else {
            0.0
        };
        self.value = (self.value + step).min(PROGRESS_COMPLETE);
        self.value
    }

    pub fn complete(&mut self) {
        self.value = PROGRESS_COMPLETE;
    }

    fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionMachine {
    state: SubmissionState,
    timing: SubmissionTiming,
    progress: ProgressMeter,
    progress_timer: Option<TimerId>,
    completion_timer: Option<TimerId>,
    redirect_timer: Option<TimerId>,
    attempts: u32,
    receipt: Option<SubmissionReceipt>,
    failure: Option<SubmissionFailure>,
}

impl SubmissionMachine {
    pub fn new(timing: SubmissionTiming, seed: Option<u64>) -> Self {
        Self {
            state: SubmissionState::Idle,
            timing,
            progress: ProgressMeter::new(timing.max_progress_step, seed),
            progress_timer: None,
            completion_timer: None,
            redirect_timer: None,
            attempts: 0,
            receipt: None,
            failure: None,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress.value()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    pub fn failure(&self) -> Option<&SubmissionFailure> {
        self.failure.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// `Idle -> Submitting`. Ignored in every other state.
    pub fn begin(&mut self, timers: &mut TimerQueue<WizardTimer>) -> bool {
        if self.state != SubmissionState::Idle {
            return false;
        }
        self.state = SubmissionState::Submitting;
        self.attempts += 1;
        self.failure = None;
        self.progress.reset();
        self.progress_timer =
            Some(timers.start_repeating(WizardTimer::Progress, self.timing.progress_tick));
        self.completion_timer =
            Some(timers.start_once(WizardTimer::Completion, self.timing.completion_delay));
        tracing::info!(attempt = self.attempts, "submission started");
        true
    }

    pub fn on_progress_tick(&mut self) -> f64 {
        if self.state != SubmissionState::Submitting {
            return self.progress.value();
        }
        self.progress.tick()
    }

    /// Applies the backend outcome. The progress timer is cancelled before the
    /// state changes so no tick is observed in a terminal state.
    pub fn complete(
        &mut self,
        timers: &mut TimerQueue<WizardTimer>,
        outcome: Result<SubmissionReceipt, SubmissionFailure>,
    ) -> SubmissionState {
        if self.state != SubmissionState::Submitting {
            return self.state;
        }
        if let Some(id) = self.progress_timer.take() {
            timers.cancel(id);
        }
        if let Some(id) = self.completion_timer.take() {
            timers.cancel(id);
        }
        self.progress.complete();

        match outcome {
            Ok(receipt) => {
                timers.cancel_all();
                tracing::info!(reference = %receipt.reference, "submission accepted");
                self.receipt = Some(receipt);
                self.state = SubmissionState::Success;
                self.redirect_timer =
                    Some(timers.start_once(WizardTimer::Redirect, self.timing.redirect_delay));
            }
            Err(failure) => {
                tracing::warn!(error = %failure, attempt = self.attempts, "submission failed");
                self.failure = Some(failure);
                self.state = SubmissionState::Error;
            }
        }
        self.state
    }

    /// Consumes the pending redirect, if this timer is the one we scheduled.
    pub fn take_redirect(&mut self, id: TimerId) -> bool {
        if self.redirect_timer == Some(id) {
            self.redirect_timer = None;
            true
        } else {
            false
        }
    }

    /// `Error -> Idle`. Collected values are not the machine's concern and stay.
    pub fn retry(&mut self) -> bool {
        if self.state != SubmissionState::Error {
            return false;
        }
        self.state = SubmissionState::Idle;
        self.progress.reset();
        tracing::info!(attempts = self.attempts, "submission reset for retry");
        true
    }

    /// Clears every timer this machine started.
    pub fn teardown(&mut self, timers: &mut TimerQueue<WizardTimer>) {
        for id in [
            self.progress_timer.take(),
            self.completion_timer.take(),
            self.redirect_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            timers.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> SubmissionMachine {
        SubmissionMachine::new(SubmissionTiming::default(), Some(7))
    }

    #[test]
    fn progress_is_monotonic_and_capped() {
        let mut meter = ProgressMeter::new(15.0, Some(42));
        let mut last = meter.value();
        for _ in 0..200 {
            let next = meter.tick();
            assert!(next >= last);
            assert!(next <= PROGRESS_COMPLETE);
            last = next;
        }
        assert_eq!(last, PROGRESS_COMPLETE);
    }

    #[test]
    fn begin_only_from_idle() {
        let mut timers = TimerQueue::new();
        let mut machine = machine();
        assert!(machine.begin(&mut timers));
        assert!(!machine.begin(&mut timers));
        assert_eq!(machine.attempts(), 1);
        assert_eq!(timers.pending(), 2);
    }

    #[test]
    fn failure_keeps_no_timers_and_allows_retry() {
        let mut timers = TimerQueue::new();
        let mut machine = machine();
        machine.begin(&mut timers);
        let state = machine.complete(&mut timers, Err(SubmissionFailure::new("offline")));
        assert_eq!(state, SubmissionState::Error);
        assert_eq!(timers.pending(), 0);
        assert_eq!(machine.progress(), PROGRESS_COMPLETE);
        assert_eq!(machine.failure().map(|f| f.message.as_str()), Some("offline"));

        assert!(machine.retry());
        assert_eq!(machine.state(), SubmissionState::Idle);
        assert_eq!(machine.progress(), 0.0);
        assert!(!machine.retry());
    }

    #[test]
    fn success_schedules_exactly_one_redirect() {
        let mut timers = TimerQueue::new();
        let mut machine = machine();
        machine.begin(&mut timers);
        let state = machine.complete(&mut timers, Ok(SubmissionReceipt::issue()));
        assert_eq!(state, SubmissionState::Success);
        assert_eq!(timers.pending(), 1);

        let fired = timers.pop_due(Duration::from_secs(10)).unwrap();
        assert_eq!(fired.kind, WizardTimer::Redirect);
        assert!(machine.take_redirect(fired.id));
        assert!(!machine.take_redirect(fired.id));
    }

    #[test]
    fn simulated_backend_honours_extreme_ratios() {
        let payload = SubmissionPayload {
            form: "test".into(),
            attempt: 1,
            submitted_at: Utc::now(),
            fields: crate::wizard::store::FieldStore::from_descriptor(
                &crate::wizard::schema::WizardDescriptor::new("test", "Test", Vec::new()),
            ),
        };
        let mut always = SimulatedBackend::new(1.0, None);
        let mut never = SimulatedBackend::new(0.0, None);
        for _ in 0..20 {
            assert!(always.resolve(&payload).is_ok());
            assert!(never.resolve(&payload).is_err());
        }
    }
}
