//! Core shell loop, dispatch, and the form session helpers shared by commands.

use std::{io, thread, time::Duration};

use dialoguer::theme::ColorfulTheme;
use uuid::Uuid;

use crate::{
    config::ConfigManager,
    errors::RegistrationError,
    forms::FormKind,
    wizard::{FormWizard, WizardAction, WizardEvent},
};

pub use crate::errors::CliError;

use super::commands;
use super::io as cli_io;
use super::output::{self, OutputPreferences};
use super::registry::{CommandEntry, CommandRegistry};
use super::render;
use super::terminal::{TerminalNotifier, TerminalRouter};
pub use super::shell_context::{CliMode, FormSession, ShellContext};

/// Virtual time a submission may take before the shell stops pumping timers.
const SUBMISSION_LIMIT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        Self::with_config_manager(mode, config_manager)
    }

    pub fn with_config_manager(
        mode: CliMode,
        config_manager: ConfigManager,
    ) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config = config_manager.load()?;
        output::set_preferences(OutputPreferences {
            plain: mode == CliMode::Script,
            quiet: false,
        });
        tracing::debug!(path = %config_manager.path().display(), ?mode, "shell context ready");

        Ok(ShellContext {
            mode,
            registry,
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            session: None,
            running: true,
        })
    }

    pub(crate) fn prompt(&self) -> String {
        match &self.session {
            Some(session) => format!(
                "{} [{}/{}]> ",
                session.kind,
                session.wizard.current_step(),
                session.wizard.total_steps()
            ),
            None => "registration> ".into(),
        }
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.print_warning(&err.to_string());
                return Ok(LoopControl::Continue);
            }
        };

        if tokens.is_empty() {
            return Ok(LoopControl::Continue);
        }

        let command = tokens[0].to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, &tokens[0], &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = self.registry.suggest(input) {
            cli_io::print_info(format!("Suggestion: `{}`?", best));
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script || !self.has_session() {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Discard the current form and exit?", false)
            .map_err(CliError::from)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                self.print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::NoActiveForm => {
                self.print_error("No form in progress.");
                self.print_hint("Use `forms` to list them and `start <form>` to begin.");
                Ok(())
            }
            other => {
                self.print_error(&other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        cli_io::print_error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        cli_io::print_warning(message);
    }

    pub(crate) fn print_hint(&self, message: &str) {
        cli_io::print_hint(message);
    }

    pub(crate) fn session(&self) -> Result<&FormSession, CommandError> {
        self.session.as_ref().ok_or(CommandError::NoActiveForm)
    }

    pub(crate) fn wizard(&self) -> Result<&FormWizard, CommandError> {
        self.session().map(|session| &session.wizard)
    }

    fn wizard_mut(&mut self) -> Result<&mut FormWizard, CommandError> {
        self.session
            .as_mut()
            .map(|session| &mut session.wizard)
            .ok_or(CommandError::NoActiveForm)
    }

    /// Opens a fresh form, discarding whatever was in progress.
    pub(crate) fn start_form(&mut self, kind: FormKind) {
        self.close_form();
        let wizard = kind
            .wizard(&self.config)
            .with_router(TerminalRouter)
            .with_notifier(TerminalNotifier {
                bell: self.mode == CliMode::Interactive,
            });
        tracing::info!(form = kind.name(), "form started");
        self.session = Some(FormSession { kind, wizard });
    }

    /// Tears the current form down; its timers never fire afterwards.
    pub(crate) fn close_form(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.wizard.dismiss();
        }
    }

    /// Sends one action to the wizard and renders the outcome.
    pub(crate) fn apply(&mut self, action: WizardAction) -> Result<WizardEvent, CommandError> {
        let event = self.wizard_mut()?.dispatch(action);
        self.render_event(&event)?;
        Ok(event)
    }

    /// Resolves a 1-based item position in a record list to the item's id.
    pub(crate) fn record_id(&self, list: &str, position: &str) -> Result<Uuid, CommandError> {
        let wizard = self.wizard()?;
        let items = wizard.store().records(list).ok_or_else(|| {
            CommandError::InvalidArguments(format!("`{}` is not a list field", list))
        })?;
        let index: usize = position.parse().map_err(|_| {
            CommandError::InvalidArguments(format!("invalid item number `{}`", position))
        })?;
        index
            .checked_sub(1)
            .and_then(|idx| items.get(idx))
            .map(|item| item.id)
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "`{}` has {} item(s); there is no item {}",
                    list,
                    items.len(),
                    index
                ))
            })
    }

    pub(crate) fn render_event(&mut self, event: &WizardEvent) -> CommandResult {
        match event {
            WizardEvent::Updated | WizardEvent::Ignored => {}
            WizardEvent::Unchanged => self.print_warning("Nothing changed."),
            WizardEvent::Locked => {
                self.print_warning("The form cannot be edited while it is being submitted.")
            }
            WizardEvent::RecordAdded(_) => {
                let wizard = self.wizard()?;
                render::print_step(wizard);
            }
            WizardEvent::StepChanged(_) => render::print_step(self.wizard()?),
            WizardEvent::AtFirstStep => cli_io::print_info("Already on the first step."),
            WizardEvent::Blocked(count) => {
                self.print_error(&format!(
                    "Please fix {} error(s) before continuing.",
                    count
                ));
                render::print_errors(self.wizard()?);
            }
            WizardEvent::ConfirmRequested => return self.request_confirmation(),
            WizardEvent::RetryRequired => self.print_warning(
                "The last submission failed. Use `retry` to reopen the form, then `next` to submit again.",
            ),
            WizardEvent::ConfirmCancelled => cli_io::print_info("Submission cancelled."),
            WizardEvent::SubmissionStarted => cli_io::print_info("Submitting registration..."),
            WizardEvent::Progress(value) => output::progress(cli_io::progress_bar(*value)),
            WizardEvent::Succeeded => {
                let reference = self
                    .wizard()?
                    .receipt()
                    .map(|receipt| receipt.reference.to_string())
                    .unwrap_or_default();
                cli_io::print_success(format!(
                    "Registration submitted successfully. Reference: {}",
                    reference
                ));
            }
            WizardEvent::Failed(message) => {
                self.print_error(&format!("Submission failed: {}", message));
                self.print_hint("Use `retry` to edit and submit again.");
            }
            WizardEvent::Navigated(_) => {
                self.session = None;
            }
            WizardEvent::RetryReady => {
                cli_io::print_info("Form reopened. Your answers were kept.");
            }
            WizardEvent::Dismissed => cli_io::print_info("Form discarded."),
        }
        Ok(())
    }

    fn request_confirmation(&mut self) -> CommandResult {
        if self.mode == CliMode::Script {
            cli_io::print_info(
                "All steps are complete. Use `confirm` to submit or `cancel` to keep editing.",
            );
            return Ok(());
        }
        let accepted =
            cli_io::confirm_action(&self.theme, "Submit your registration now?", true)?;
        let action = if accepted {
            WizardAction::ConfirmSubmit
        } else {
            WizardAction::CancelConfirm
        };
        if self.apply(action)? == WizardEvent::SubmissionStarted {
            self.drive_submission(None)?;
        }
        Ok(())
    }

    /// Pumps the wizard's timers. Interactive sessions wait in real time;
    /// scripts jump the virtual clock straight to each deadline.
    pub(crate) fn drive_submission(&mut self, budget: Option<Duration>) -> CommandResult {
        let limit = budget.unwrap_or(SUBMISSION_LIMIT);
        let mut spent = Duration::ZERO;
        loop {
            let Some(session) = self.session.as_mut() else {
                break;
            };
            let Some(wait) = session.wizard.next_timer_in() else {
                break;
            };
            if spent + wait > limit {
                if budget.is_some() {
                    let remaining = limit - spent;
                    let events = session.wizard.advance(remaining);
                    for event in &events {
                        self.render_event(event)?;
                    }
                }
                break;
            }
            if self.mode == CliMode::Interactive {
                thread::sleep(wait);
            }
            spent += wait;
            let events = session.wizard.advance(wait);
            for event in &events {
                self.render_event(event)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("No form in progress. Use `start <form>` first.")]
    NoActiveForm,
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] RegistrationError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CliError> for CommandError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Core(inner) => CommandError::Core(inner),
            CliError::Input(message) | CliError::Command(message) => {
                CommandError::InvalidArguments(message)
            }
        }
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[cfg(test)]
pub(crate) fn process_script(
    config_manager: ConfigManager,
    lines: &[&str],
) -> Result<ShellContext, CliError> {
    let mut app = ShellContext::with_config_manager(CliMode::Script, config_manager)?;
    for line in lines {
        match app.process_line(line)? {
            LoopControl::Continue => {}
            LoopControl::Exit => break,
        }
    }
    Ok(app)
}
