use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bump this when adding new fields with non-trivial defaults.
/// When a loaded config has a lower version, it is re-saved to disk
/// so that users see the new keys in their `config.toml`.
const CURRENT_CONFIG_VERSION: u32 = 1;

pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_MASCOT_PATH: &str = "mascot.txt";

const API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub config_version: u32,
    pub data_dir: Option<String>,
    pub mascot_path: Option<String>,
    pub chat_provider: Option<String>,
    pub chat_model: Option<String>,
    pub google_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_version: 0,
            data_dir: Some(DEFAULT_DATA_DIR.to_string()),
            mascot_path: Some(DEFAULT_MASCOT_PATH.to_string()),
            chat_provider: Some("google".to_string()),
            chat_model: Some(DEFAULT_CHAT_MODEL.to_string()),
            google_api_key: None,
        }
    }
}

impl Settings {
    fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".corebot")
    }

    fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    pub fn load_global() -> Self {
        let path = Self::global_config_path();
        if path.exists() {
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(err) => {
                    log::warn!("failed to read {}: {err}. Using defaults.", path.display());
                    return Self {
                        config_version: CURRENT_CONFIG_VERSION,
                        ..Self::default()
                    };
                }
            };
            let mut settings: Self = match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(err) => {
                    log::warn!("failed to parse {}: {err}. Using defaults.", path.display());
                    Self::default()
                }
            };

            // Re-save when the file is from an older version so new fields
            // (with their defaults) appear on disk.
            if settings.config_version < CURRENT_CONFIG_VERSION {
                settings.config_version = CURRENT_CONFIG_VERSION;
                if let Err(err) = settings.save_global() {
                    log::warn!("failed to migrate config to v{CURRENT_CONFIG_VERSION}: {err}");
                }
            }

            settings
        } else {
            Self {
                config_version: CURRENT_CONFIG_VERSION,
                ..Self::default()
            }
        }
    }

    pub fn save_global(&self) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::create_dir_all(Self::global_config_dir())?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::global_config_path(), content)?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(
            self.data_dir
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(DEFAULT_DATA_DIR),
        )
    }

    pub fn mascot_path(&self) -> PathBuf {
        PathBuf::from(
            self.mascot_path
                .as_deref()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(DEFAULT_MASCOT_PATH),
        )
    }

    pub fn chat_provider(&self) -> String {
        self.chat_provider
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or("google")
            .to_string()
    }

    pub fn chat_model(&self) -> String {
        self.chat_model
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_CHAT_MODEL)
            .to_string()
    }

    /// Environment wins over the settings file. A missing credential is an
    /// unrecoverable startup error for the caller.
    pub fn resolve_api_key(&self) -> Result<String, String> {
        resolve_api_key_from(std::env::var(API_KEY_ENV_VAR).ok(), self)
    }

    /// CLI flags override the settings file for one invocation. The file on
    /// disk is left untouched.
    pub fn merged_with_args(
        &self,
        data_dir: Option<&str>,
        model: Option<&str>,
        mascot: Option<&str>,
    ) -> Self {
        let mut merged = self.clone();
        if let Some(value) = data_dir {
            merged.data_dir = Some(value.to_string());
        }
        if let Some(value) = model {
            merged.chat_model = Some(value.to_string());
        }
        if let Some(value) = mascot {
            merged.mascot_path = Some(value.to_string());
        }
        merged
    }
}

fn resolve_api_key_from(env_value: Option<String>, settings: &Settings) -> Result<String, String> {
    env_value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            settings
                .google_api_key
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned)
        })
        .ok_or_else(|| {
            format!(
                "{API_KEY_ENV_VAR} is not set and no google_api_key is configured in {}",
                Settings::global_config_path().display()
            )
        })
}

#[cfg(test)]
mod tests {
    use super::{resolve_api_key_from, Settings, DEFAULT_CHAT_MODEL, DEFAULT_DATA_DIR};

    #[test]
    fn defaults_cover_model_and_folders() {
        let settings = Settings::default();
        assert_eq!(settings.chat_model(), DEFAULT_CHAT_MODEL);
        assert_eq!(settings.chat_provider(), "google");
        assert_eq!(settings.data_dir().to_str(), Some(DEFAULT_DATA_DIR));
    }

    #[test]
    fn environment_credential_wins_over_settings() {
        let settings = Settings {
            google_api_key: Some("file-key".to_string()),
            ..Settings::default()
        };

        let resolved = resolve_api_key_from(Some("  env-key ".to_string()), &settings);
        assert_eq!(resolved.as_deref(), Ok("env-key"));
    }

    #[test]
    fn settings_credential_is_the_fallback() {
        let settings = Settings {
            google_api_key: Some("file-key".to_string()),
            ..Settings::default()
        };

        assert_eq!(
            resolve_api_key_from(None, &settings).as_deref(),
            Ok("file-key")
        );
        assert_eq!(
            resolve_api_key_from(Some("   ".to_string()), &settings).as_deref(),
            Ok("file-key")
        );
    }

    #[test]
    fn missing_credential_is_an_error() {
        let settings = Settings::default();
        let resolved = resolve_api_key_from(None, &settings);
        assert!(resolved.is_err());
        assert!(resolved.unwrap_err().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn cli_flags_override_the_settings_file() {
        let settings = Settings::default();

        let merged = settings.merged_with_args(Some("notes"), Some("gemini-1.5-flash"), None);
        assert_eq!(merged.data_dir().to_str(), Some("notes"));
        assert_eq!(merged.chat_model(), "gemini-1.5-flash");
        assert_eq!(merged.mascot_path(), settings.mascot_path());

        let untouched = settings.merged_with_args(None, None, None);
        assert_eq!(untouched.data_dir(), settings.data_dir());
        assert_eq!(untouched.chat_model(), settings.chat_model());
    }

    #[test]
    fn blank_overrides_fall_back_to_defaults() {
        let settings = Settings {
            chat_model: Some("  ".to_string()),
            data_dir: Some(String::new()),
            ..Settings::default()
        };
        assert_eq!(settings.chat_model(), DEFAULT_CHAT_MODEL);
        assert_eq!(settings.data_dir().to_str(), Some(DEFAULT_DATA_DIR));
    }
}
