//! Session configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding the save slot.
    pub save_dir: PathBuf,
    pub slot_name: String,
    pub user_index: u32,
    /// Wait between the host's ready signal and map generation.
    pub generation_delay_ms: u64,
    pub log_level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("saves"),
            slot_name: "SavedGame".to_string(),
            user_index: 0,
            generation_delay_ms: 2000,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SessionConfig {
    /// Load from a JSON file. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// `<save_dir>/<slot_name>_<user_index>.sav`
    pub fn slot_path(&self) -> PathBuf {
        self.save_dir
            .join(format!("{}_{}.sav", self.slot_name, self.user_index))
    }

    pub fn generation_delay(&self) -> Duration {
        Duration::from_millis(self.generation_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.slot_path(), PathBuf::from("saves/SavedGame_0.sav"));
        assert_eq!(config.generation_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SessionConfig::from_json(r#"{ "save_dir": "/tmp/valley", "user_index": 2 }"#).unwrap();
        assert_eq!(config.slot_path(), PathBuf::from("/tmp/valley/SavedGame_2.sav"));
        assert_eq!(config.generation_delay_ms, 2000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = SessionConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(missing, SessionConfig::default());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            SessionConfig::load(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }
}
