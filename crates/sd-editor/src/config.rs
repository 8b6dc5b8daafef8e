//! Editor configuration.

use sd_core::EmitConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Jobs kept on the undo stack. Default: **100**.
    pub max_undo_depth: usize,

    /// Layout of saved markup.
    pub emit: EmitConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: 100,
            emit: EmitConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a JSON settings object. Missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "emit": { "indent": 2 } }"#).unwrap();
        assert_eq!(config.max_undo_depth, 100);
        assert_eq!(config.emit.indent, 2);
        assert!(config.emit.declaration);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(EditorConfig::from_json("{ max_undo_depth: }").is_err());
    }
}
