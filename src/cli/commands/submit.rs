use std::time::Duration;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::wizard::{WizardAction, WizardEvent};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "next",
            "Validate this step and continue (or ask to submit)",
            "next",
            cmd_next,
        ),
        CommandEntry::new("back", "Return to the previous step", "back", cmd_back),
        CommandEntry::new(
            "confirm",
            "Submit after the final step",
            "confirm [--no-wait]",
            cmd_confirm,
        ),
        CommandEntry::new(
            "cancel",
            "Dismiss the submit prompt, or discard the form",
            "cancel",
            cmd_cancel,
        ),
        CommandEntry::new(
            "wait",
            "Let a running submission advance",
            "wait [milliseconds]",
            cmd_wait,
        ),
        CommandEntry::new("retry", "Reopen the form after a failed submission", "retry", cmd_retry),
    ]
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.apply(WizardAction::Next)?;
    Ok(())
}

fn cmd_back(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.apply(WizardAction::Back)?;
    Ok(())
}

fn cmd_confirm(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let wait = match args.first() {
        None => true,
        Some(&"--no-wait") => false,
        Some(other) => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown option `{}`",
                other
            )))
        }
    };
    if !context.wizard()?.confirm_pending() {
        context.print_warning("Nothing to confirm. Finish the last step with `next` first.");
        return Ok(());
    }
    if context.apply(WizardAction::ConfirmSubmit)? == WizardEvent::SubmissionStarted && wait {
        context.drive_submission(None)?;
    }
    Ok(())
}

fn cmd_cancel(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.wizard()?.confirm_pending() {
        context.apply(WizardAction::CancelConfirm)?;
        return Ok(());
    }
    let event = context.apply(WizardAction::Dismiss)?;
    if event == WizardEvent::Dismissed {
        context.session = None;
    }
    Ok(())
}

fn cmd_wait(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let budget = match args.first() {
        Some(raw) => Some(Duration::from_millis(raw.parse().map_err(|_| {
            CommandError::InvalidArguments(format!("invalid duration `{}` (milliseconds)", raw))
        })?)),
        None => None,
    };
    if context.wizard()?.next_timer_in().is_none() {
        io::print_info("Nothing is running.");
        return Ok(());
    }
    context.drive_submission(budget)
}

fn cmd_retry(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.apply(WizardAction::Retry)? == WizardEvent::Ignored {
        context.print_warning("Retry is only available after a failed submission.");
    }
    Ok(())
}
