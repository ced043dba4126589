//! Multi-step form wizard: field store, validation, step navigation, and the
//! submission state machine.
//!
//! A [`FormWizard`] is built from a [`WizardDescriptor`] and owns all of its
//! state. Hosts feed it user edits, pump [`FormWizard::advance`] with elapsed
//! time, and render whatever the accessors report. Nothing here blocks or
//! spawns threads.

mod collaborators;
mod engine;
mod navigator;
mod schema;
mod store;
mod submission;
mod timer;
mod validation;
mod values;

pub use collaborators::{
    FilePicker, LogNotifier, LogRouter, NotificationKind, Notifier, RecordingNotifier,
    RecordingRouter, Router,
};
pub use engine::{realtime_error, FileTarget, FormSnapshot, FormWizard, WizardAction, WizardEvent};
pub use navigator::{StepMove, StepNavigator};
pub use schema::{FieldDescriptor, FieldKind, RecordSchema, Rule, StepDescriptor, WizardDescriptor};
pub use store::{FieldStore, FileSlot};
pub use submission::{
    ProgressMeter, SimulatedBackend, SubmissionBackend, SubmissionFailure, SubmissionMachine,
    SubmissionPayload, SubmissionReceipt, SubmissionState, SubmissionTiming, WizardTimer,
    PROGRESS_COMPLETE,
};
pub use timer::{FiredTimer, TimerId, TimerQueue};
pub use validation::{
    canonical_choice, check_text, check_value, record_key, record_prefix, ValidationErrors,
    ValidationMode, Validator,
};
pub use values::{FieldValue, FileRef, RecordItem};
