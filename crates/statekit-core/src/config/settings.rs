//! Parsing of `statekit.toml`

use std::path::Path;

use serde::{Deserialize, Serialize};
use statekit_fs::NormalizedPath;

use crate::backup::{BackupPolicy, DEFAULT_BACKUP_SUFFIX};
use crate::{Error, Result};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "statekit.toml";

fn default_state_path() -> String {
    "terraform.tfstate".to_string()
}

fn default_backup_enabled() -> bool {
    true
}

fn default_backup_suffix() -> String {
    DEFAULT_BACKUP_SUFFIX.to_string()
}

/// `[state]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateSection {
    /// State file used when no path is given on the command line
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

/// `[backup]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupSection {
    #[serde(default = "default_backup_enabled")]
    pub enabled: bool,
    /// Suffix of derived backup names
    #[serde(default = "default_backup_suffix")]
    pub suffix: String,
}

impl Default for BackupSection {
    fn default() -> Self {
        Self {
            enabled: default_backup_enabled(),
            suffix: default_backup_suffix(),
        }
    }
}

/// Settings read from `statekit.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub state: StateSection,
    #[serde(default)]
    pub backup: BackupSection,
}

impl Settings {
    /// Parse settings from TOML text.
    ///
    /// `origin` only labels errors.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            path: origin.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Load `statekit.toml` from `dir`, or defaults when it does not exist.
    pub fn load(dir: &NormalizedPath) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::debug!(dir = %dir, "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path.to_native()).map_err(|e| Error::Config {
            path: path.to_native(),
            message: e.to_string(),
        })?;
        let settings = Self::parse(&content, &path.to_native())?;
        if settings.state.path.trim().is_empty() {
            return Err(Error::Config {
                path: path.to_native(),
                message: "state.path must not be empty".to_string(),
            });
        }
        tracing::debug!(path = %path, "loaded configuration");
        Ok(settings)
    }

    /// Default state file, resolved against `dir` when relative.
    pub fn state_path(&self, dir: &NormalizedPath) -> NormalizedPath {
        resolve(dir, &self.state.path)
    }

    /// Backup policy for states that have no explicit backup path.
    pub fn backup_policy(&self) -> BackupPolicy {
        if self.backup.enabled {
            BackupPolicy::Derived {
                suffix: self.backup.suffix.clone(),
            }
        } else {
            BackupPolicy::Disabled
        }
    }
}

/// Resolve `path` against `dir` unless it is already absolute.
pub(crate) fn resolve(dir: &NormalizedPath, path: &str) -> NormalizedPath {
    if Path::new(path).is_absolute() {
        NormalizedPath::new(path)
    } else {
        dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::parse("", Path::new("statekit.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.state.path, "terraform.tfstate");
        assert_eq!(settings.backup_policy(), BackupPolicy::default());
    }

    #[test]
    fn parse_reads_both_sections() {
        let settings = Settings::parse(
            r#"
[state]
path = "envs/prod.tfstate"

[backup]
enabled = false
"#,
            Path::new("statekit.toml"),
        )
        .unwrap();

        assert_eq!(settings.state.path, "envs/prod.tfstate");
        assert_eq!(settings.backup_policy(), BackupPolicy::Disabled);
        assert_eq!(settings.backup.suffix, ".backup");
    }

    #[test]
    fn unknown_keys_are_config_errors() {
        let err = Settings::parse("[backup]\nkeep = 3\n", Path::new("statekit.toml")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
        assert!(err.to_string().contains("keep"));
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&NormalizedPath::new(dir.path())).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_reads_file_and_resolves_state_path() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[state]\npath = \"custom.tfstate\"\n[backup]\nsuffix = \".bak\"\n",
        )
        .unwrap();
        let root = NormalizedPath::new(dir.path());

        let settings = Settings::load(&root).unwrap();

        assert_eq!(settings.state_path(&root), root.join("custom.tfstate"));
        assert_eq!(
            settings.backup_policy(),
            BackupPolicy::Derived {
                suffix: ".bak".to_string()
            }
        );
    }

    #[test]
    fn empty_state_path_is_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[state]\npath = \"\"\n").unwrap();

        let err = Settings::load(&NormalizedPath::new(dir.path())).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }
}
