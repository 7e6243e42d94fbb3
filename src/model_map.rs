use serde::{Deserialize, Serialize};

pub const DEFAULT_BIG_MODEL: &str = "gpt-5.3-codex";
pub const DEFAULT_SMALL_MODEL: &str = "gpt-5.3-codex-spark";
pub const DEFAULT_THINKING_MODEL: &str = "gpt-5.3-codex";

/// Prefixes of names that already belong to the backend and pass through.
const PASSTHROUGH_PREFIXES: [&str; 4] = ["gpt-", "o1", "o3", "o4"];

/// Client model name to backend model name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMap {
    /// Target for `sonnet` names.
    pub big_model: String,
    /// Target for `haiku` names.
    pub small_model: String,
    /// Target for `opus` names.
    pub thinking_model: String,
    /// Target for everything unrecognised. Falls back to `big_model` when unset.
    pub default_model: Option<String>,
}

impl Default for ModelMap {
    fn default() -> Self {
        Self {
            big_model: DEFAULT_BIG_MODEL.to_string(),
            small_model: DEFAULT_SMALL_MODEL.to_string(),
            thinking_model: DEFAULT_THINKING_MODEL.to_string(),
            default_model: None,
        }
    }
}

impl ModelMap {
    pub fn map(&self, model: &str) -> String {
        let lower = model.to_lowercase();
        if lower.contains("opus") {
            self.thinking_model.clone()
        } else if lower.contains("sonnet") {
            self.big_model.clone()
        } else if lower.contains("haiku") {
            self.small_model.clone()
        } else if PASSTHROUGH_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
            model.to_string()
        } else {
            self.default_model
                .clone()
                .unwrap_or_else(|| self.big_model.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_keywords() {
        let models = ModelMap::default();
        assert_eq!(models.map("claude-opus-4-1"), DEFAULT_THINKING_MODEL);
        assert_eq!(models.map("claude-3-5-Sonnet-latest"), DEFAULT_BIG_MODEL);
        assert_eq!(models.map("CLAUDE-HAIKU-4-5"), DEFAULT_SMALL_MODEL);
    }

    #[test]
    fn test_backend_names_pass_through_unchanged() {
        let models = ModelMap::default();
        assert_eq!(models.map("gpt-4.1-mini"), "gpt-4.1-mini");
        assert_eq!(models.map("GPT-5"), "GPT-5");
        assert_eq!(models.map("o3-pro"), "o3-pro");
        assert_eq!(models.map("o4-mini"), "o4-mini");
    }

    #[test]
    fn test_unknown_names_use_default() {
        let mut models = ModelMap::default();
        assert_eq!(models.map("mistral-large"), DEFAULT_BIG_MODEL);
        assert_eq!(models.map(""), DEFAULT_BIG_MODEL);

        models.default_model = Some("gpt-5-mini".to_string());
        assert_eq!(models.map("mistral-large"), "gpt-5-mini");
    }

    #[test]
    fn test_overrides_apply() {
        let models = ModelMap {
            small_model: "gpt-5-nano".to_string(),
            ..ModelMap::default()
        };
        assert_eq!(models.map("claude-haiku"), "gpt-5-nano");
    }
}
