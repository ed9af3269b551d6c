//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sr_core::{DstOverride, GapPolicy};

/// Application configuration.
///
/// Every field can be overridden per run by the matching `report` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Zone the hotel's export timestamps are recorded in.
    pub source_timezone: String,
    /// Zone the report is rendered in.
    pub target_timezone: String,
    pub dst_override: DstOverride,
    /// Nominal check-in, `HH:MM` hotel time.
    pub checkin: String,
    /// Nominal checkout, `HH:MM` hotel time.
    pub checkout: String,
    pub gap_policy: GapPolicy,
    /// Directory report files are written to.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_timezone: "Asia/Taipei".to_string(),
            target_timezone: "Asia/Taipei".to_string(),
            dst_override: DstOverride::Auto,
            checkin: "14:00".to_string(),
            checkout: "11:00".to_string(),
            gap_policy: GapPolicy::MergeIntoNext,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // SR_GAP_POLICY, SR_TARGET_TIMEZONE, ...
        figment = figment.merge(Env::prefixed("SR_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for sr.
///
/// On Linux: `~/.config/sr`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sr"))
}
