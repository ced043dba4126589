use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::wizard::{record_key, FieldDescriptor, FieldValue, FormWizard};

pub fn print_step(wizard: &FormWizard) {
    let number = wizard.current_step();
    let Some(step) = wizard.descriptor().step(number) else {
        return;
    };
    output_section(format!(
        "Step {} of {}: {}",
        number,
        wizard.total_steps(),
        step.title
    ));
    for field in &step.fields {
        print_field(wizard, field);
    }
}

fn print_field(wizard: &FormWizard, field: &FieldDescriptor) {
    let marker = if field.is_required() { "*" } else { " " };
    let Some(value) = wizard.store().value(field.key) else {
        return;
    };
    match (value, field.record_schema()) {
        (FieldValue::Records(items), Some(schema)) => {
            io::print_info(format!("{} {} ({})", marker, field.label, field.key));
            for (position, item) in items.iter().enumerate() {
                io::print_info(format!("    {} {}", schema.item_label, position + 1));
                for sub in &schema.fields {
                    let text = item.text(sub.key);
                    let shown = if text.is_empty() { "[unfilled]" } else { text };
                    io::print_info(format!("      {:<12} {}", sub.key, shown));
                    if let Some(message) = wizard.error(&record_key(field.key, item.id, sub.key)) {
                        io::print_warning(format!("      {}", message));
                    }
                }
                if let Some(label) = schema.file_label {
                    let file = item
                        .file
                        .as_ref()
                        .map(|file| file.display_name().to_string())
                        .unwrap_or_else(|| "[no file]".into());
                    io::print_info(format!("      {:<12} {}", label, file));
                }
            }
        }
        _ => {
            io::print_info(format!(
                "{} {:<28} {}",
                marker,
                format!("{} ({})", field.label, field.key),
                value.summary()
            ));
            if let Some(message) = wizard.error(field.key) {
                io::print_warning(format!("    {}", message));
            }
        }
    }
    if !field.options().is_empty() {
        io::print_hint(format!("    Options: {}", field.options().join(", ")));
    }
    if let Some(help) = field.help {
        io::print_hint(format!("    {}", help));
    }
}

pub fn print_errors(wizard: &FormWizard) {
    if wizard.errors().is_empty() {
        io::print_success("No validation errors.");
        return;
    }
    for (key, message) in wizard.errors().iter() {
        io::print_warning(format!("{}: {}", key, message));
    }
}

pub fn print_status(wizard: &FormWizard) {
    let descriptor = wizard.descriptor();
    output_section(format!("{} ({})", descriptor.title, descriptor.name));
    io::print_info(format!(
        "  Step         : {} of {}",
        wizard.current_step(),
        wizard.total_steps()
    ));
    io::print_info(format!("  Submission   : {:?}", wizard.submission_state()));
    io::print_info(format!("  Progress     : {}", io::progress_bar(wizard.progress())));
    io::print_info(format!("  Errors       : {}", wizard.errors().len()));
    if wizard.confirm_pending() {
        io::print_info("  Awaiting confirmation; use `confirm` or `cancel`.");
    }
    if let Some(receipt) = wizard.receipt() {
        io::print_info(format!("  Reference    : {}", receipt.reference));
    }
    if let Some(failure) = wizard.failure() {
        io::print_warning(format!("  Last failure : {}", failure.message));
    }
    if let Some(wait) = wizard.next_timer_in() {
        io::print_info(format!("  Next timer in: {} ms", wait.as_millis()));
    }
}
