//! Query configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Knobs shared by every query issued through a [`crate::Contacts`] handle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Return raw contacts (and contacts) that have no attribute rows, and
    /// let attribute predicates match them through their raw contact and
    /// contact columns.
    pub include_blanks: bool,

    /// Apply offset and limit in memory when the store ignored them.
    pub force_offset_and_limit: bool,

    /// Character substituted for every character of a redacted string.
    pub mask_char: char,

    /// Largest identifier list sent in a single `IN (...)`. Larger sets are
    /// split into several lists joined with OR.
    pub max_in_clause_ids: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            include_blanks: false,
            force_offset_and_limit: true,
            mask_char: '*',
            max_in_clause_ids: 900,
        }
    }
}

impl QueryConfig {
    /// Parse a configuration from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: QueryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.max_in_clause_ids == 0 {
            return Err(Error::Config("max_in_clause_ids must be positive".into()));
        }
        Ok(())
    }

    /// Set whether blank raw contacts are returned.
    pub fn with_include_blanks(mut self, include: bool) -> Self {
        self.include_blanks = include;
        self
    }

    /// Set whether offset and limit are enforced in memory.
    pub fn with_force_offset_and_limit(mut self, force: bool) -> Self {
        self.force_offset_and_limit = force;
        self
    }

    /// Set the redaction mask character.
    pub fn with_mask_char(mut self, mask: char) -> Self {
        self.mask_char = mask;
        self
    }

    /// Set the `IN` list size limit. Zero is treated as one.
    pub fn with_max_in_clause_ids(mut self, max: usize) -> Self {
        self.max_in_clause_ids = max.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert!(!config.include_blanks);
        assert!(config.force_offset_and_limit);
        assert_eq!(config.mask_char, '*');
        assert_eq!(config.max_in_clause_ids, 900);
    }

    #[test]
    fn test_partial_json() {
        let config =
            QueryConfig::from_json(r##"{"include_blanks": true, "mask_char": "#"}"##).unwrap();
        assert!(config.include_blanks);
        assert_eq!(config.mask_char, '#');
        assert!(config.force_offset_and_limit);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            QueryConfig::from_json("{\"include_blanks\": 3}"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            QueryConfig::from_json("{\"max_in_clause_ids\": 0}"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"max_in_clause_ids\": 2}}").unwrap();
        let config = QueryConfig::load(file.path()).unwrap();
        assert_eq!(config.max_in_clause_ids, 2);
        assert!(QueryConfig::load(file.path().with_extension("missing")).is_err());
    }

    #[test]
    fn test_builders() {
        let config = QueryConfig::default()
            .with_include_blanks(true)
            .with_force_offset_and_limit(false)
            .with_max_in_clause_ids(0);
        assert!(config.include_blanks);
        assert!(!config.force_offset_and_limit);
        assert_eq!(config.max_in_clause_ids, 1);
    }
}
