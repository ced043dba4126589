//! Concrete registration flows built on the generic wizard.

pub mod music_registration;
pub mod signup;

use std::{fmt, str::FromStr};

use crate::config::WizardConfig;
use crate::errors::RegistrationError;
use crate::wizard::{FormWizard, WizardDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    MusicRegistration,
    ArtistSignup,
    AdminSignup,
}

impl FormKind {
    pub const ALL: [FormKind; 3] = [
        FormKind::MusicRegistration,
        FormKind::ArtistSignup,
        FormKind::AdminSignup,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormKind::MusicRegistration => music_registration::NAME,
            FormKind::ArtistSignup => signup::ARTIST_NAME,
            FormKind::AdminSignup => signup::ADMIN_NAME,
        }
    }

    pub fn descriptor(self, config: &WizardConfig) -> WizardDescriptor {
        match self {
            FormKind::MusicRegistration => music_registration::descriptor(),
            FormKind::ArtistSignup => signup::artist_descriptor(),
            FormKind::AdminSignup => signup::admin_descriptor(&config.admin_code),
        }
    }

    /// Builds a wizard with the simulated backend and logging collaborators.
    pub fn wizard(self, config: &WizardConfig) -> FormWizard {
        FormWizard::new(self.descriptor(config), config)
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormKind {
    type Err = RegistrationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .or(match normalized.as_str() {
                "music" => Some(FormKind::MusicRegistration),
                "artist" | "signup" => Some(FormKind::ArtistSignup),
                "admin" => Some(FormKind::AdminSignup),
                _ => None,
            })
            .ok_or_else(|| RegistrationError::UnknownForm(input.trim().to_string()))
    }
}
