use serde::{Deserialize, Serialize};

use super::DEFAULT_HISTORY_PREVIEW_CHARS;

/// UI configuration for the TUI
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Characters of each message shown in the history sidebar
    pub history_preview_chars: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            history_preview_chars: DEFAULT_HISTORY_PREVIEW_CHARS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preview_is_forty_chars() {
        assert_eq!(UiConfig::default().history_preview_chars, 40);
    }

    #[test]
    fn deserialize_preview_width() {
        let config: UiConfig = toml::from_str("history_preview_chars = 24").unwrap();
        assert_eq!(config.history_preview_chars, 24);
    }
}
