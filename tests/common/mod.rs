#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use once_cell::sync::Lazy;
use registration_core::{
    config::{ConfigManager, WizardConfig},
    forms::FormKind,
    wizard::{FileRef, FileSlot, FormWizard, RecordingNotifier, RecordingRouter},
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated application home with `config` saved in it.
pub fn setup_home(config: &WizardConfig) -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    ConfigManager::with_base_dir(base.clone())
        .expect("create config manager for temp dir")
        .save(config)
        .expect("save test config");
    base
}

/// Deterministic configuration whose backend always gives the same answer.
pub fn config(accepts: bool) -> WizardConfig {
    WizardConfig {
        success_ratio: if accepts { 1.0 } else { 0.0 },
        seed: Some(42),
        ..WizardConfig::default()
    }
}

pub struct Harness {
    pub wizard: FormWizard,
    pub router: RecordingRouter,
    pub notifier: RecordingNotifier,
}

pub fn harness(kind: FormKind, accepts: bool) -> Harness {
    let router = RecordingRouter::new();
    let notifier = RecordingNotifier::new();
    let wizard = kind
        .wizard(&config(accepts))
        .with_router(router.clone())
        .with_notifier(notifier.clone());
    Harness {
        wizard,
        router,
        notifier,
    }
}

pub fn fill_personal_step(wizard: &mut FormWizard) {
    wizard.set_field("fullName", "Thandiwe Moyo");
    wizard.set_field("address", "12 Independence Ave, Windhoek");
    wizard.set_file(
        FileSlot::Field("idDocument"),
        Some(FileRef::new("passport.pdf", 2048)),
    );
}

pub fn fill_first_song(wizard: &mut FormWizard) {
    let id = wizard.store().records("songs").expect("songs list")[0].id;
    wizard.update_record_item("songs", id, "title", "Desert Rain");
    wizard.update_record_item("songs", id, "genre", "Jazz");
    wizard.update_record_item("songs", id, "composer", "T. Moyo");
}
