//! Versioned cache generation names.
//!
//! A generation is a named bucket of cached responses, `<stem>-v<N>`, e.g.
//! `jeju-trip-v12`. Deploy tooling bumps `N` whenever site content changes;
//! the worker is configured with exactly one current generation and evicts
//! every other one on activation.

use std::fmt;

use crate::Error;

/// A parsed `<stem>-v<N>` cache generation name.
///
/// The verbatim name is kept so the rendered form always matches what the
/// configuration and the storage rows contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Generation {
    name: String,
    version: u32,
}

impl Generation {
    /// Parse a generation name, rejecting anything that does not match
    /// `<stem>-v<N>` with a non-empty stem and decimal `N`.
    ///
    /// The split is on the last `-v`, so stems may themselves contain
    /// version-like fragments: `a-v2-v3` parses as stem `a-v2`, version 3.
    pub fn parse(name: &str) -> Result<Self, Error> {
        let Some((stem, digits)) = name.rsplit_once("-v") else {
            return Err(Error::InvalidGeneration(format!("{name}: missing -v<N> suffix")));
        };

        if stem.is_empty() {
            return Err(Error::InvalidGeneration(format!("{name}: empty stem")));
        }

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidGeneration(format!("{name}: version is not a number")));
        }

        let version = digits
            .parse::<u32>()
            .map_err(|_| Error::InvalidGeneration(format!("{name}: version out of range")))?;

        Ok(Self { name: name.to_string(), version })
    }

    /// The full generation name, exactly as parsed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stem shared by all generations of the same site.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once("-v") {
            Some((stem, _)) => stem,
            None => &self.name,
        }
    }

    /// The version number after the `-v` separator.
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl std::str::FromStr for Generation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let generation = Generation::parse("jeju-trip-v12").unwrap();
        assert_eq!(generation.stem(), "jeju-trip");
        assert_eq!(generation.version(), 12);
        assert_eq!(generation.name(), "jeju-trip-v12");
    }

    #[test]
    fn test_parse_splits_on_last_marker() {
        let generation = Generation::parse("a-v2-v3").unwrap();
        assert_eq!(generation.stem(), "a-v2");
        assert_eq!(generation.version(), 3);
    }

    #[test]
    fn test_parse_keeps_verbatim_name() {
        let generation = Generation::parse("trip-v007").unwrap();
        assert_eq!(generation.version(), 7);
        assert_eq!(generation.name(), "trip-v007");
        assert_eq!(generation.to_string(), "trip-v007");
    }

    #[test]
    fn test_parse_rejects_missing_suffix() {
        assert!(Generation::parse("jeju").is_err());
        assert!(Generation::parse("jeju-12").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_stem() {
        assert!(Generation::parse("-v3").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_version() {
        assert!(Generation::parse("trip-v").is_err());
        assert!(Generation::parse("trip-v1a").is_err());
        assert!(Generation::parse("trip-vv2").is_err());
        assert!(Generation::parse("trip-v99999999999999999999").is_err());
    }

    #[test]
    fn test_from_str() {
        let generation: Generation = "trip-v3".parse().unwrap();
        assert_eq!(generation.version(), 3);
    }
}
