use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::errors::{RegistrationError, Result};
use crate::utils::paths::{app_data_dir, config_dir_in, config_file_in, ensure_dir};
use crate::wizard::SubmissionTiming;

const TMP_SUFFIX: &str = "tmp";

/// Registration code accepted by the admin sign-up flow unless configured.
pub const DEFAULT_ADMIN_CODE: &str = "NASCAM2023";

/// Tunables for the wizard's simulated submission and the admin sign-up gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub progress_tick_ms: u64,
    pub max_progress_step: f64,
    pub completion_delay_ms: u64,
    pub redirect_delay_ms: u64,
    /// Probability in `[0, 1]` that the simulated backend accepts a submission.
    pub success_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub admin_code: String,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            progress_tick_ms: 300,
            max_progress_step: 15.0,
            completion_delay_ms: 3000,
            redirect_delay_ms: 3000,
            success_ratio: 0.95,
            seed: None,
            admin_code: DEFAULT_ADMIN_CODE.into(),
        }
    }
}

impl WizardConfig {
    pub fn timing(&self) -> SubmissionTiming {
        SubmissionTiming {
            progress_tick: Duration::from_millis(self.progress_tick_ms),
            max_progress_step: self.max_progress_step,
            completion_delay: Duration::from_millis(self.completion_delay_ms),
            redirect_delay: Duration::from_millis(self.redirect_delay_ms),
        }
    }

    /// Rejects values the wizard cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.success_ratio) {
            return Err(RegistrationError::Config(format!(
                "success_ratio must be between 0 and 1 (got {})",
                self.success_ratio
            )));
        }
        if self.progress_tick_ms == 0 {
            return Err(RegistrationError::Config(
                "progress_tick_ms must be greater than zero".into(),
            ));
        }
        if !self.max_progress_step.is_finite() || self.max_progress_step < 0.0 {
            return Err(RegistrationError::Config(
                "max_progress_step must be a non-negative number".into(),
            ));
        }
        if self.admin_code.trim().is_empty() {
            return Err(RegistrationError::Config("admin_code cannot be empty".into()));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        ensure_dir(&config_dir_in(&base))?;
        Ok(Self {
            path: config_file_in(&base),
        })
    }

    /// Loads the stored configuration, or defaults when none was saved yet.
    pub fn load(&self) -> Result<WizardConfig> {
        let config = if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data)?
        } else {
            WizardConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &WizardConfig) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), WizardConfig::default());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let config = WizardConfig {
            success_ratio: 1.0,
            seed: Some(9),
            completion_delay_ms: 1500,
            ..WizardConfig::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
        assert!(!tmp_path(manager.path()).exists());
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "success_ratio": 0.5 }"#).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config.success_ratio, 0.5);
        assert_eq!(config.progress_tick_ms, 300);
    }

    #[test]
    fn out_of_range_ratio_is_rejected() {
        let config = WizardConfig {
            success_ratio: 1.5,
            ..WizardConfig::default()
        };
        assert!(matches!(config.validate(), Err(RegistrationError::Config(_))));
    }

    #[test]
    fn timing_converts_milliseconds() {
        let timing = WizardConfig::default().timing();
        assert_eq!(timing.progress_tick, Duration::from_millis(300));
        assert_eq!(timing.redirect_delay, Duration::from_secs(3));
    }
}
