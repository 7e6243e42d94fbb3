use crate::model_map::ModelMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_UPSTREAM_URL: &str = "https://chatgpt.com/backend-api/codex/responses";
pub const DEFAULT_CLIENT_ID: &str = "app_EMoamEEZ73f0CkXaXp7hrann";
pub const DEFAULT_TOKEN_URL: &str = "https://auth.openai.com/oauth/token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upstream_url: String,
    /// Read timeout for the backend call, in seconds.
    pub request_timeout_secs: u64,
    pub models: ModelMap,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Codex CLI credential file. `~/.codex/auth.json` when unset.
    pub path: Option<PathBuf>,
    pub client_id: String,
    pub token_url: String,
    /// Tokens expiring within this many seconds are refreshed before use.
    pub refresh_margin_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            request_timeout_secs: 300,
            models: ModelMap::default(),
            auth: AuthSettings::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            path: None,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            refresh_margin_secs: 60,
        }
    }
}

impl AuthSettings {
    pub fn auth_file(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot locate home directory for ~/.codex/auth.json"))?;
        Ok(home.join(".codex").join("auth.json"))
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "request_timeout_secs: 30\nmodels:\n  small_model: gpt-5-mini\nauth:\n  path: /tmp/auth.json\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.models.small_model, "gpt-5-mini");
        assert_eq!(config.models.big_model, "gpt-5.3-codex");
        assert_eq!(config.auth.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(config.auth.auth_file().unwrap(), PathBuf::from("/tmp/auth.json"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs: [not a number").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
