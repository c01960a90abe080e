//! Phrase → sign visual asset lookup.
//!
//! Loaded once at startup from a JSON object file such as
//! `{"hello": "hello.gif", "default": "unknown_sign.gif"}` and read-only
//! afterwards. The `default` entry is mandatory; it is added when the file
//! omits it.

use crate::defaults;
use crate::error::{Result, SignStreamError};
use std::collections::HashMap;
use std::path::Path;

/// Read-only mapping from canonical phrases to asset identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct SignAssetMap {
    entries: HashMap<String, String>,
    fallback: String,
}

/// Lowercase, trim and strip surrounding punctuation for lookup.
fn normalize(phrase: &str) -> String {
    phrase
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_lowercase()
}

impl SignAssetMap {
    /// A map holding only the fallback entry.
    pub fn fallback_only() -> Self {
        Self::from_entries(HashMap::new())
    }

    /// Build from raw entries; a missing `default` entry gets the built-in asset.
    pub fn from_entries(mut entries: HashMap<String, String>) -> Self {
        let fallback = entries
            .remove(defaults::DEFAULT_ASSET_KEY)
            .unwrap_or_else(|| defaults::DEFAULT_ASSET.to_string());
        Self { entries, fallback }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| SignStreamError::AssetMap {
                message: format!("expected a JSON object of strings: {e}"),
            })?;
        Ok(Self::from_entries(entries))
    }

    /// Load from `path`.
    ///
    /// A missing file yields [`fallback_only`](Self::fallback_only) and logs
    /// the condition; an unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let map = Self::from_json(&contents)?;
                tracing::info!(path = %path.display(), count = map.len(), "Loaded sign asset map");
                Ok(map)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(path = %path.display(), "Sign asset map not found, using default entry only");
                Ok(Self::fallback_only())
            }
            Err(e) => Err(SignStreamError::AssetMap {
                message: format!("failed to read {}: {e}", path.display()),
            }),
        }
    }

    /// Asset for `phrase`: exact match, then normalized match, then the fallback.
    pub fn resolve(&self, phrase: &str) -> &str {
        if let Some(asset) = self.entries.get(phrase) {
            return asset;
        }
        self.entries
            .get(&normalize(phrase))
            .unwrap_or(&self.fallback)
    }

    /// Exact lookup without fallback.
    pub fn get(&self, phrase: &str) -> Option<&str> {
        self.entries.get(phrase).map(String::as_str)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Number of entries, excluding the fallback.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SignAssetMap {
    fn default() -> Self {
        Self::fallback_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_exact_match() {
        let map = SignAssetMap::from_json(r#"{"hello": "hello.gif", "default": "idle.gif"}"#).unwrap();
        assert_eq!(map.resolve("hello"), "hello.gif");
        assert_eq!(map.fallback(), "idle.gif");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_unknown_phrase_falls_back() {
        let map = SignAssetMap::from_json(r#"{"hello": "hello.gif", "default": "idle.gif"}"#).unwrap();
        assert_eq!(map.resolve("good night"), "idle.gif");
    }

    #[test]
    fn test_missing_default_entry_is_added() {
        let map = SignAssetMap::from_json(r#"{"hello": "hello.gif"}"#).unwrap();
        assert_eq!(map.resolve("nothing here"), defaults::DEFAULT_ASSET);
    }

    #[test]
    fn test_normalized_match() {
        let map = SignAssetMap::from_json(r#"{"thank you": "thank_you.gif"}"#).unwrap();
        assert_eq!(map.resolve("Thank you."), "thank_you.gif");
        assert_eq!(map.get("Thank you."), None);
    }

    #[test]
    fn test_non_object_json_is_error() {
        let result = SignAssetMap::from_json(r#"["hello.gif"]"#);
        assert!(matches!(result, Err(SignStreamError::AssetMap { .. })));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let map = SignAssetMap::load(Path::new("/nonexistent/signstream/mapping.json")).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.resolve("hello"), defaults::DEFAULT_ASSET);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"yes": "yes.gif", "default": "unknown.gif"}"#).unwrap();

        let map = SignAssetMap::load(file.path()).unwrap();
        assert_eq!(map.resolve("yes"), "yes.gif");
        assert_eq!(map.resolve("no"), "unknown.gif");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(SignAssetMap::load(file.path()).is_err());
    }
}
