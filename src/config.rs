use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-local directory that receives manually installed binaries.
    #[serde(default = "default_bin_dir")]
    pub bin_dir: String,
    /// System directory for optional privileged symlinks.
    #[serde(default = "default_system_bin_dir")]
    pub system_bin_dir: String,
    /// Directory holding the append-only run log.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_shell_profile")]
    pub shell_profile: String,
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout: String,
    #[serde(default = "default_download_timeout")]
    pub download_timeout: String,
    #[serde(default = "default_github_api")]
    pub github_api: String,
    /// Token for the release-listing API. Falls back to GITHUB_TOKEN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// Optional YAML catalog that replaces the built-in tiers and tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
    /// Answer yes to every confirmation prompt.
    #[serde(default)]
    pub assume_yes: bool,
}

fn default_bin_dir() -> String {
    "~/.local/bin".to_string()
}

fn default_system_bin_dir() -> String {
    "/usr/local/bin".to_string()
}

fn default_log_dir() -> String {
    "~/.local/state/devstrap".to_string()
}

fn default_shell_profile() -> String {
    "~/.bashrc".to_string()
}

fn default_discovery_timeout() -> String {
    "10s".to_string()
}

fn default_download_timeout() -> String {
    "120s".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bin_dir: default_bin_dir(),
            system_bin_dir: default_system_bin_dir(),
            log_dir: default_log_dir(),
            shell_profile: default_shell_profile(),
            discovery_timeout: default_discovery_timeout(),
            download_timeout: default_download_timeout(),
            github_api: default_github_api(),
            github_token: None,
            catalog_path: None,
            assume_yes: false,
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| BootstrapError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(".config").join("devstrap"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&content)
                .map_err(|e| BootstrapError::Config(format!("Invalid config: {}", e)))?
        } else {
            AppConfig::default()
        };

        if config.github_token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                if !token.is_empty() {
                    config.github_token = Some(token);
                }
            }
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| BootstrapError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("discovery_timeout", &self.discovery_timeout),
            ("download_timeout", &self.download_timeout),
        ] {
            if parse_duration(value).is_none() {
                return Err(BootstrapError::Config(format!(
                    "Invalid {} '{}'. Use format like '10s', '2m', or '30'",
                    field, value
                )));
            }
        }

        for (field, value) in [
            ("bin_dir", &self.bin_dir),
            ("system_bin_dir", &self.system_bin_dir),
            ("log_dir", &self.log_dir),
        ] {
            if value.trim().is_empty() {
                return Err(BootstrapError::Config(format!("{} must not be empty", field)));
            }
        }

        Ok(())
    }

    pub fn bin_dir(&self) -> PathBuf {
        expand(&self.bin_dir)
    }

    pub fn system_bin_dir(&self) -> PathBuf {
        expand(&self.system_bin_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        expand(&self.log_dir)
    }

    pub fn shell_profile(&self) -> PathBuf {
        expand(&self.shell_profile)
    }

    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog_path.as_deref().map(expand)
    }

    pub fn discovery_timeout(&self) -> Duration {
        parse_duration(&self.discovery_timeout).unwrap_or(Duration::from_secs(10))
    }

    pub fn download_timeout(&self) -> Duration {
        parse_duration(&self.download_timeout).unwrap_or(Duration::from_secs(120))
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().to_lowercase();

    if let Some(hours) = s.strip_suffix('h') {
        hours.parse::<u64>().ok().map(|h| Duration::from_secs(h * 3600))
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else if let Some(seconds) = s.strip_suffix('s') {
        seconds.parse::<u64>().ok().map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("30m"), Some(Duration::from_secs(1800)));
        assert_eq!(parse_duration("45S"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("  90  "), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("5x"), None);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bin_dir, "~/.local/bin");
        assert_eq!(config.system_bin_dir, "/usr/local/bin");
        assert_eq!(config.github_api, "https://api.github.com");
        assert_eq!(config.discovery_timeout(), Duration::from_secs(10));
        assert_eq!(config.download_timeout(), Duration::from_secs(120));
        assert!(!config.assume_yes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let yaml = r#"
bin_dir: /opt/tools/bin
discovery_timeout: 3s
assume_yes: true
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bin_dir(), PathBuf::from("/opt/tools/bin"));
        assert_eq!(config.discovery_timeout(), Duration::from_secs(3));
        assert!(config.assume_yes);
        assert_eq!(config.shell_profile, "~/.bashrc");
        assert!(config.catalog_path().is_none());
    }

    #[test]
    fn test_config_serialization_skips_unset_options() {
        let yaml = serde_yaml::to_string(&AppConfig::default()).unwrap();
        assert!(yaml.contains("bin_dir: ~/.local/bin"));
        assert!(!yaml.contains("github_token"));
        assert!(!yaml.contains("catalog_path"));
    }

    #[test]
    fn test_tilde_paths_are_expanded() {
        let config = AppConfig::default();
        assert!(!config.bin_dir().to_string_lossy().starts_with('~'));
        assert!(config.bin_dir().ends_with(".local/bin"));
    }

    #[test]
    fn test_validate_rejects_bad_timeout() {
        let config = AppConfig {
            download_timeout: "forever".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid download_timeout"));
    }

    #[test]
    fn test_validate_rejects_empty_bin_dir() {
        let config = AppConfig {
            bin_dir: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("bin_dir"));
    }
}
