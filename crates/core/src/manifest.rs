//! Install-time cache manifest.
//!
//! The manifest is a JSON array of URL strings generated by the site's build
//! tooling. Entries may be site-relative (`./theme.css`, `/images/map.png`)
//! or absolute; order is preserved as written.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Ordered list of asset URLs primed into the cache at install time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<String>,
}

impl Manifest {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidManifest(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Parse a manifest from its JSON form, a flat array of URL strings.
    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let manifest: Manifest =
            serde_json::from_str(raw).map_err(|e| Error::InvalidManifest(e.to_string()))?;

        if manifest.entries.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::InvalidManifest("empty entry".to_string()));
        }

        Ok(manifest)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_preserves_order() {
        let manifest = Manifest::from_json(r#"["./index.html", "./theme.css", "/images/map.png"]"#).unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.entries()[0], "./index.html");
        assert_eq!(manifest.entries()[2], "/images/map.png");
    }

    #[test]
    fn test_from_json_empty_array() {
        let manifest = Manifest::from_json("[]").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(Manifest::from_json(r#"{"entries": []}"#).is_err());
        assert!(Manifest::from_json("not json").is_err());
    }

    #[test]
    fn test_from_json_rejects_non_string_entries() {
        assert!(Manifest::from_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_from_json_rejects_blank_entries() {
        assert!(Manifest::from_json(r#"["./a.css", ""]"#).is_err());
        assert!(Manifest::from_json(r#"["   "]"#).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Manifest::load("/nonexistent/cache-manifest.json").unwrap_err();
        assert!(matches!(err, Error::InvalidManifest(_)));
    }
}
