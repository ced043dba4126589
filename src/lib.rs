#![doc(test(attr(deny(warnings))))]

//! Registration Core provides a multi-step form wizard (field store,
//! validation, step navigation, and a timer-driven submission state machine)
//! together with the concrete registration forms and a scriptable shell.

pub mod cli;
pub mod config;
pub mod errors;
pub mod forms;
pub mod utils;
pub mod wizard;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!(build = %utils::build_info::current().summary(), "Registration Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
