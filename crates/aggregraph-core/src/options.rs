use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SURROGATE_KEY_NAME: &str = "__surrogate_id";
pub const DEFAULT_COLUMN_SEPARATOR: &str = "_";

/// Naming and strictness choices visible to schema authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Member name of the synthesized key on `children` rows without declared keys.
    pub surrogate_key_name: String,
    pub require_application_name: bool,
    /// Fall back to key columns as the instance label when no member is flagged.
    pub keys_as_display_name: bool,
    /// Joins qualifier segments in renderer-facing key column names.
    pub column_separator: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            surrogate_key_name: DEFAULT_SURROGATE_KEY_NAME.to_string(),
            require_application_name: true,
            keys_as_display_name: true,
            column_separator: DEFAULT_COLUMN_SEPARATOR.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsLoadError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid resolve options: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResolveOptions {
    pub fn from_json_str(text: &str) -> Result<Self, OptionsLoadError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, OptionsLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| OptionsLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
