//! The wizard itself: one owned state object, updated only through the
//! operations below (or [`FormWizard::dispatch`], which routes actions to them).

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::config::WizardConfig;
use crate::errors::RegistrationError;

use super::collaborators::{LogNotifier, LogRouter, NotificationKind, Notifier, Router};
use super::navigator::{StepMove, StepNavigator};
use super::schema::WizardDescriptor;
use super::store::{FieldStore, FileSlot};
use super::submission::{
    SimulatedBackend, SubmissionBackend, SubmissionFailure, SubmissionMachine, SubmissionPayload,
    SubmissionReceipt, SubmissionState, WizardTimer,
};
use super::timer::TimerQueue;
use super::validation::{record_key, record_prefix, ValidationErrors, ValidationMode, Validator};
use super::values::FileRef;

const BACKEND_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// The backend draws from its own stream so outcomes do not track progress steps.
pub(crate) fn backend_seed(seed: Option<u64>) -> Option<u64> {
    seed.map(|seed| seed ^ BACKEND_SEED_SALT)
}

/// Owned counterpart of [`FileSlot`], used inside actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTarget {
    Field(String),
    Record { list: String, id: Uuid },
}

/// Every state change a host can request.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    SetField { name: String, value: String },
    Toggle { name: String, value: String, included: bool },
    AddRecord { list: String },
    UpdateRecord { list: String, id: Uuid, field: String, value: String },
    RemoveRecord { list: String, id: Uuid },
    SetFile { target: FileTarget, file: Option<FileRef> },
    Next,
    Back,
    ConfirmSubmit,
    CancelConfirm,
    Retry,
    Dismiss,
}

/// Outcome of an operation, for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    Updated,
    /// The request named something that does not exist or changed nothing.
    Unchanged,
    /// Edits and navigation are not accepted in the current state.
    Locked,
    RecordAdded(Uuid),
    StepChanged(usize),
    AtFirstStep,
    Blocked(usize),
    ConfirmRequested,
    /// The last step is valid but the failed submission must be retried first.
    RetryRequired,
    ConfirmCancelled,
    SubmissionStarted,
    Progress(f64),
    Succeeded,
    Failed(String),
    Navigated(String),
    RetryReady,
    Dismissed,
    Ignored,
}

/// Serializable view of the collected data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub form: String,
    pub current_step: usize,
    pub fields: FieldStore,
}

pub struct FormWizard {
    descriptor: WizardDescriptor,
    store: FieldStore,
    errors: ValidationErrors,
    navigator: StepNavigator,
    submission: SubmissionMachine,
    timers: TimerQueue<WizardTimer>,
    confirm_pending: bool,
    dismissed: bool,
    backend: Box<dyn SubmissionBackend>,
    router: Box<dyn Router>,
    notifier: Box<dyn Notifier>,
}

impl FormWizard {
    pub fn new(descriptor: WizardDescriptor, config: &WizardConfig) -> Self {
        let store = FieldStore::from_descriptor(&descriptor);
        let navigator = StepNavigator::new(descriptor.total_steps());
        tracing::debug!(
            form = descriptor.name,
            steps = navigator.total(),
            fields = store.len(),
            "wizard created"
        );
        Self {
            store,
            navigator,
            errors: ValidationErrors::new(),
            submission: SubmissionMachine::new(config.timing(), config.seed),
            timers: TimerQueue::new(),
            confirm_pending: false,
            dismissed: false,
            backend: Box::new(SimulatedBackend::new(
                config.success_ratio,
                backend_seed(config.seed),
            )),
            router: Box::new(LogRouter),
            notifier: Box::new(LogNotifier),
            descriptor,
        }
    }

    pub fn with_backend(mut self, backend: impl SubmissionBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    pub fn with_router(mut self, router: impl Router + 'static) -> Self {
        self.router = Box::new(router);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn descriptor(&self) -> &WizardDescriptor {
        &self.descriptor
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key)
    }

    pub fn current_step(&self) -> usize {
        self.navigator.current()
    }

    pub fn total_steps(&self) -> usize {
        self.navigator.total()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.submission.state()
    }

    pub fn progress(&self) -> f64 {
        self.submission.progress()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.submission.receipt()
    }

    pub fn failure(&self) -> Option<&SubmissionFailure> {
        self.submission.failure()
    }

    pub fn confirm_pending(&self) -> bool {
        self.confirm_pending
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Time until the next timer fires, if any is running.
    pub fn next_timer_in(&self) -> Option<Duration> {
        self.timers
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.timers.now()))
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            form: self.descriptor.name.to_string(),
            current_step: self.navigator.current(),
            fields: self.store.clone(),
        }
    }

    pub fn dispatch(&mut self, action: WizardAction) -> WizardEvent {
        match action {
            WizardAction::SetField { name, value } => self.set_field(&name, &value),
            WizardAction::Toggle {
                name,
                value,
                included,
            } => self.toggle_list_membership(&name, &value, included),
            WizardAction::AddRecord { list } => self.add_record_item(&list),
            WizardAction::UpdateRecord {
                list,
                id,
                field,
                value,
            } => self.update_record_item(&list, id, &field, &value),
            WizardAction::RemoveRecord { list, id } => self.remove_record_item(&list, id),
            WizardAction::SetFile { target, file } => match &target {
                FileTarget::Field(name) => self.set_file(FileSlot::Field(name), file),
                FileTarget::Record { list, id } => {
                    self.set_file(FileSlot::Record { list, id: *id }, file)
                }
            },
            WizardAction::Next => self.go_next(),
            WizardAction::Back => self.go_back(),
            WizardAction::ConfirmSubmit => self.confirm_submit(),
            WizardAction::CancelConfirm => self.cancel_confirm(),
            WizardAction::Retry => self.retry(),
            WizardAction::Dismiss => self.dismiss(),
        }
    }

    /// Edits are accepted while idle or after a failed submission.
    fn editable(&self) -> bool {
        !self.dismissed
            && matches!(
                self.submission.state(),
                SubmissionState::Idle | SubmissionState::Error
            )
    }

    /// Any edit invalidates an open confirmation prompt.
    fn touch(&mut self) {
        if self.confirm_pending {
            tracing::debug!("confirmation dismissed by edit");
            self.confirm_pending = false;
        }
    }

    pub fn set_field(&mut self, name: &str, value: &str) -> WizardEvent {
        if !self.editable() {
            return WizardEvent::Locked;
        }
        let Some(field) = self.descriptor.field(name) else {
            tracing::warn!(field = name, "set_field on undeclared field ignored");
            return WizardEvent::Unchanged;
        };
        let realtime = field.realtime;
        if !self.store.set_text(name, value) {
            tracing::warn!(field = name, "set_field on non-text field ignored");
            return WizardEvent::Unchanged;
        }
        self.touch();

        let validator = Validator::new(&self.descriptor);
        if realtime {
            match validator.validate_realtime(&self.store, name) {
                Some(message) => self.errors.insert(name, message),
                None => {
                    self.errors.remove(name);
                }
            }
        } else {
            self.errors.remove(name);
        }

        // Cross-field rules: re-check fields compared against this one.
        for dependent in self.descriptor.dependents_of(name) {
            let has_value = self
                .store
                .text(dependent.key)
                .is_some_and(|text| !text.is_empty());
            if !has_value {
                continue;
            }
            match validator.validate_realtime(&self.store, dependent.key) {
                Some(message) => self.errors.insert(dependent.key, message),
                None => {
                    self.errors.remove(dependent.key);
                }
            }
        }
        tracing::debug!(field = name, "field updated");
        WizardEvent::Updated
    }

    pub fn toggle_list_membership(&mut self, name: &str, value: &str, included: bool) -> WizardEvent {
        if !self.editable() {
            return WizardEvent::Locked;
        }
        if !self.store.toggle(name, value, included) {
            return WizardEvent::Unchanged;
        }
        self.touch();
        self.errors.remove(name);
        tracing::debug!(field = name, value, included, "list membership toggled");
        WizardEvent::Updated
    }

    pub fn add_record_item(&mut self, list: &str) -> WizardEvent {
        if !self.editable() {
            return WizardEvent::Locked;
        }
        match self.store.add_record(list) {
            Some(id) => {
                self.touch();
                tracing::debug!(list, %id, "record added");
                WizardEvent::RecordAdded(id)
            }
            None => {
                tracing::warn!(list, "add_record_item on undeclared list ignored");
                WizardEvent::Unchanged
            }
        }
    }

    pub fn update_record_item(&mut self, list: &str, id: Uuid, field: &str, value: &str) -> WizardEvent {
        if !self.editable() {
            return WizardEvent::Locked;
        }
        if !self.store.update_record(list, id, field, value) {
            tracing::warn!(list, %id, field, "update_record_item matched nothing");
            return WizardEvent::Unchanged;
        }
        self.touch();
        self.errors.remove(&record_key(list, id, field));
        WizardEvent::Updated
    }

    pub fn remove_record_item(&mut self, list: &str, id: Uuid) -> WizardEvent {
        if !self.editable() {
            return WizardEvent::Locked;
        }
        if !self.store.remove_record(list, id) {
            tracing::debug!(list, %id, "remove_record_item refused");
            return WizardEvent::Unchanged;
        }
        self.touch();
        let purged = self.errors.remove_prefix(&record_prefix(list, id));
        tracing::debug!(list, %id, purged, "record removed");
        WizardEvent::Updated
    }

    pub fn set_file(&mut self, slot: FileSlot<'_>, file: Option<FileRef>) -> WizardEvent {
        if !self.editable() {
            return WizardEvent::Locked;
        }
        if !self.store.set_file(slot, file) {
            tracing::warn!(?slot, "set_file matched nothing");
            return WizardEvent::Unchanged;
        }
        self.touch();
        match slot {
            FileSlot::Field(name) => {
                self.errors.remove(name);
            }
            FileSlot::Record { list, id } => {
                self.errors.remove(&record_key(list, id, "file"));
            }
        }
        WizardEvent::Updated
    }

    /// Validates the current step and moves forward, or opens the submit
    /// confirmation when already on the last step.
    pub fn go_next(&mut self) -> WizardEvent {
        if !self.editable() {
            return WizardEvent::Locked;
        }
        let step = self.navigator.current();
        let validator = Validator::new(&self.descriptor);
        let fresh = validator.validate_step(&self.store, step);
        self.errors
            .replace_scope(|key| validator.step_owns_key(step, key), fresh.clone());

        match self.navigator.go_next(&fresh) {
            StepMove::Moved(next) => {
                tracing::info!(form = self.descriptor.name, step = next, "advanced");
                WizardEvent::StepChanged(next)
            }
            StepMove::ReadyToSubmit if self.submission.state() != SubmissionState::Idle => {
                WizardEvent::RetryRequired
            }
            StepMove::ReadyToSubmit => {
                self.confirm_pending = true;
                tracing::info!(form = self.descriptor.name, "ready to submit");
                WizardEvent::ConfirmRequested
            }
            StepMove::Blocked(count) => {
                tracing::info!(form = self.descriptor.name, step, errors = count, "step blocked");
                WizardEvent::Blocked(count)
            }
            StepMove::AtFirstStep => WizardEvent::Unchanged,
        }
    }

    pub fn go_back(&mut self) -> WizardEvent {
        if !self.editable() {
            return WizardEvent::Locked;
        }
        self.touch();
        match self.navigator.go_back() {
            StepMove::Moved(step) => WizardEvent::StepChanged(step),
            _ => WizardEvent::AtFirstStep,
        }
    }

    /// Accepts the confirmation prompt and starts the submission.
    pub fn confirm_submit(&mut self) -> WizardEvent {
        if self.dismissed || self.submission.is_submitting() || !self.confirm_pending {
            return WizardEvent::Ignored;
        }
        if !self.submission.begin(&mut self.timers) {
            return WizardEvent::Ignored;
        }
        self.confirm_pending = false;
        WizardEvent::SubmissionStarted
    }

    pub fn cancel_confirm(&mut self) -> WizardEvent {
        if !self.confirm_pending {
            return WizardEvent::Ignored;
        }
        self.confirm_pending = false;
        WizardEvent::ConfirmCancelled
    }

    pub fn retry(&mut self) -> WizardEvent {
        if self.dismissed || !self.submission.retry() {
            return WizardEvent::Ignored;
        }
        self.confirm_pending = false;
        WizardEvent::RetryReady
    }

    /// Tears the wizard down: every pending timer is cleared and nothing
    /// fires afterwards.
    pub fn dismiss(&mut self) -> WizardEvent {
        if self.dismissed {
            return WizardEvent::Ignored;
        }
        self.submission.teardown(&mut self.timers);
        let cleared = self.timers.cancel_all();
        self.dismissed = true;
        self.confirm_pending = false;
        tracing::info!(form = self.descriptor.name, cleared, "wizard dismissed");
        WizardEvent::Dismissed
    }

    /// Advances the virtual clock, firing every timer that comes due.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<WizardEvent> {
        let mut events = Vec::new();
        if self.dismissed {
            return events;
        }
        let until = self.timers.now() + elapsed;
        while let Some(fired) = self.timers.pop_due(until) {
            match fired.kind {
                WizardTimer::Progress => {
                    events.push(WizardEvent::Progress(self.submission.on_progress_tick()));
                }
                WizardTimer::Completion => {
                    let payload = self.payload();
                    let outcome = self.backend.resolve(&payload);
                    match self.submission.complete(&mut self.timers, outcome) {
                        SubmissionState::Success => {
                            self.notifier.notify(NotificationKind::Success);
                            events.push(WizardEvent::Succeeded);
                        }
                        SubmissionState::Error => {
                            self.notifier.notify(NotificationKind::Error);
                            let message = self
                                .submission
                                .failure()
                                .map(|failure| failure.message.clone())
                                .unwrap_or_default();
                            events.push(WizardEvent::Failed(message));
                        }
                        _ => {}
                    }
                }
                WizardTimer::Redirect => {
                    if self.submission.take_redirect(fired.id) {
                        let path = self.descriptor.redirect_path;
                        self.router.navigate(path);
                        events.push(WizardEvent::Navigated(path.to_string()));
                    }
                }
            }
        }
        self.timers.settle(until);
        events
    }

    /// Advances until no timer is pending, `limit` at most.
    pub fn run_until_idle(&mut self, limit: Duration) -> Vec<WizardEvent> {
        let mut events = Vec::new();
        let mut spent = Duration::ZERO;
        while let Some(wait) = self.next_timer_in() {
            if spent + wait > limit {
                break;
            }
            spent += wait;
            events.extend(self.advance(wait));
        }
        events
    }

    /// Serializes the collected data and signals the save. Nothing is written
    /// anywhere; the caller decides what to do with the JSON.
    pub fn save_draft(&mut self) -> Result<String, RegistrationError> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        tracing::info!(form = self.descriptor.name, bytes = json.len(), "draft saved");
        self.notifier.notify(NotificationKind::DraftSaved);
        Ok(json)
    }

    fn payload(&self) -> SubmissionPayload {
        SubmissionPayload {
            form: self.descriptor.name.to_string(),
            attempt: self.submission.attempts(),
            submitted_at: Utc::now(),
            fields: self.store.clone(),
        }
    }
}

/// Realtime check of a single field, for hosts that validate on their own
/// schedule (e.g. on blur).
pub fn realtime_error(wizard: &FormWizard, key: &str) -> Option<String> {
    let field = wizard.descriptor.field(key)?;
    let value = wizard.store.value(key)?;
    super::validation::check_value(field, value, &wizard.store, ValidationMode::Realtime)
}
