use dialoguer::theme::ColorfulTheme;

use crate::{
    config::{ConfigManager, WizardConfig},
    forms::FormKind,
    wizard::FormWizard,
};

use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// The form currently being filled in.
pub struct FormSession {
    pub kind: FormKind,
    pub wizard: FormWizard,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: WizardConfig,
    pub session: Option<FormSession>,
    pub running: bool,
}

impl ShellContext {
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }
}
