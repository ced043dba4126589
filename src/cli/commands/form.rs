//! Commands that open a form and edit its fields.

use std::{fs, path::Path};

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::cli::terminal::FsFilePicker;
use crate::forms::FormKind;
use crate::wizard::{
    canonical_choice, realtime_error, FieldKind, FilePicker, FileTarget, WizardAction,
    WizardEvent,
};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("start", "Begin a registration form", "start <form>", cmd_start),
        CommandEntry::new("set", "Set a text or choice field", "set <field> <value>", cmd_set),
        CommandEntry::new(
            "toggle",
            "Add or remove a value of a multi-select field",
            "toggle <field> <value> [on|off]",
            cmd_toggle,
        ),
        CommandEntry::new("add", "Append an item to a list field", "add <list>", cmd_add),
        CommandEntry::new(
            "update",
            "Set a field of a list item",
            "update <list> <item> <field> <value>",
            cmd_update,
        ),
        CommandEntry::new("remove", "Remove a list item", "remove <list> <item>", cmd_remove),
        CommandEntry::new(
            "attach",
            "Attach a file to a field or list item",
            "attach <field> <path> | attach <list> <item> <path>",
            cmd_attach,
        ),
        CommandEntry::new(
            "detach",
            "Clear an attached file",
            "detach <field> | detach <list> <item>",
            cmd_detach,
        ),
        CommandEntry::new("status", "Show the current form", "status", cmd_status),
        CommandEntry::new("errors", "List validation errors", "errors", cmd_errors),
        CommandEntry::new(
            "draft",
            "Save a draft of the answers as JSON",
            "draft [path]",
            cmd_draft,
        ),
    ]
}

fn usage(text: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {}", text))
}

fn cmd_start(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = args.first().ok_or_else(|| usage("start <form>"))?;
    let kind: FormKind = name.parse()?;
    context.start_form(kind);
    let wizard = context.wizard()?;
    io::print_success(format!("Started {}.", wizard.descriptor().title));
    render::print_step(wizard);
    Ok(())
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (name, rest) = args
        .split_first()
        .ok_or_else(|| usage("set <field> <value>"))?;
    let value = rest.join(" ");
    let value = {
        let wizard = context.wizard()?;
        match wizard.descriptor().field(name).map(|field| &field.kind) {
            Some(FieldKind::Choice(options)) => canonical_choice(options, &value)
                .map(str::to_string)
                .unwrap_or(value),
            Some(FieldKind::Text) => value,
            Some(_) => {
                return Err(CommandError::InvalidArguments(format!(
                    "`{}` cannot be set directly; see `help toggle`, `help update`, `help attach`",
                    name
                )))
            }
            None => {
                return Err(CommandError::InvalidArguments(format!(
                    "`{}` is not a field of this form",
                    name
                )))
            }
        }
    };

    let event = context.apply(WizardAction::SetField {
        name: name.to_string(),
        value,
    })?;
    if event == WizardEvent::Updated {
        report_field(context, name)?;
    }
    Ok(())
}

/// Prints the field's error, or the realtime verdict for fields that are
/// only checked on transition.
fn report_field(context: &ShellContext, name: &str) -> CommandResult {
    let wizard = context.wizard()?;
    let message = wizard
        .error(name)
        .map(str::to_string)
        .or_else(|| realtime_error(wizard, name));
    if let Some(message) = message {
        io::print_warning(format!("{}: {}", name, message));
    }
    for dependent in wizard.descriptor().dependents_of(name) {
        if let Some(message) = wizard.error(dependent.key) {
            io::print_warning(format!("{}: {}", dependent.key, message));
        }
    }
    Ok(())
}

fn cmd_toggle(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name, value, rest @ ..] = args else {
        return Err(usage("toggle <field> <value> [on|off]"));
    };
    let included = match rest.first().map(|flag| flag.to_ascii_lowercase()) {
        None => true,
        Some(flag) if flag == "on" => true,
        Some(flag) if flag == "off" => false,
        Some(flag) => {
            return Err(CommandError::InvalidArguments(format!(
                "expected `on` or `off`, got `{}`",
                flag
            )))
        }
    };
    let canonical = {
        let wizard = context.wizard()?;
        let options = wizard
            .descriptor()
            .field(name)
            .map(|field| field.options())
            .unwrap_or_default();
        match canonical_choice(options, value) {
            Some(option) => option.to_string(),
            None if options.is_empty() => value.to_string(),
            None => {
                return Err(CommandError::InvalidArguments(format!(
                    "`{}` is not an option of `{}` ({})",
                    value,
                    name,
                    options.join(", ")
                )))
            }
        }
    };
    context.apply(WizardAction::Toggle {
        name: name.to_string(),
        value: canonical,
        included,
    })?;
    if let Some(selected) = context.wizard()?.store().list(name) {
        io::print_info(format!("{}: {}", name, selected.join(", ")));
    }
    Ok(())
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let list = args.first().ok_or_else(|| usage("add <list>"))?;
    context.apply(WizardAction::AddRecord {
        list: list.to_string(),
    })?;
    Ok(())
}

fn cmd_update(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [list, position, field, rest @ ..] = args else {
        return Err(usage("update <list> <item> <field> <value>"));
    };
    let id = context.record_id(list, position)?;
    let mut value = rest.join(" ");
    if let Some(options) = context
        .wizard()?
        .descriptor()
        .field(list)
        .and_then(|descriptor| descriptor.record_schema())
        .and_then(|schema| schema.field(field))
        .map(|sub| sub.options())
    {
        if let Some(option) = canonical_choice(options, &value) {
            value = option.to_string();
        }
    }
    context.apply(WizardAction::UpdateRecord {
        list: list.to_string(),
        id,
        field: field.to_string(),
        value,
    })?;
    Ok(())
}

fn cmd_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [list, position, ..] = args else {
        return Err(usage("remove <list> <item>"));
    };
    let id = context.record_id(list, position)?;
    match context.apply(WizardAction::RemoveRecord {
        list: list.to_string(),
        id,
    })? {
        WizardEvent::Updated => io::print_success(format!("Removed item {} of `{}`.", position, list)),
        WizardEvent::Unchanged => context.print_hint("A list always keeps at least one item."),
        _ => {}
    }
    Ok(())
}

fn file_target(context: &ShellContext, args: &[&str]) -> Result<FileTarget, CommandError> {
    match args {
        [field] => Ok(FileTarget::Field(field.to_string())),
        [list, position] => Ok(FileTarget::Record {
            list: list.to_string(),
            id: context.record_id(list, position)?,
        }),
        _ => Err(usage("attach <field> <path> | attach <list> <item> <path>")),
    }
}

fn cmd_attach(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (path, target_args) = args
        .split_last()
        .ok_or_else(|| usage("attach <field> <path> | attach <list> <item> <path>"))?;
    let target = file_target(context, target_args)?;
    let file = FsFilePicker
        .pick(path)
        .ok_or_else(|| CommandError::Message(format!("cannot read file `{}`", path)))?;
    let name = file.display_name().to_string();
    if context.apply(WizardAction::SetFile {
        target,
        file: Some(file),
    })? == WizardEvent::Updated
    {
        io::print_success(format!("Attached {}.", name));
    }
    Ok(())
}

fn cmd_detach(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let target = file_target(context, args)?;
    if context.apply(WizardAction::SetFile { target, file: None })? == WizardEvent::Updated {
        io::print_info("File cleared.");
    }
    Ok(())
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let wizard = context.wizard()?;
    render::print_status(wizard);
    render::print_step(wizard);
    Ok(())
}

fn cmd_errors(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    render::print_errors(context.wizard()?);
    Ok(())
}

fn cmd_draft(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let session = context.session.as_mut().ok_or(CommandError::NoActiveForm)?;
    let json = session.wizard.save_draft()?;
    match args.first() {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)?;
            io::print_info(format!("Draft written to {}", path.display()));
        }
        None => println!("{}", json),
    }
    Ok(())
}
