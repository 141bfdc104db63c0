//! Naming conventions for declared identifiers

use crate::{Error, Result};
use regex::Regex;

/// PascalCase for entity, property and role names.
pub const DEFAULT_IDENTIFIER_PATTERN: &str = "^[A-Z][A-Za-z0-9]*$";

/// Namespace identifiers start with a letter and are alphanumeric.
pub const DEFAULT_NAMESPACE_PATTERN: &str = "^[A-Za-z][A-Za-z0-9]*$";

/// Compiled naming rules.
#[derive(Debug, Clone)]
pub struct NamingRules {
    identifier: Regex,
    namespace: Regex,
}

impl NamingRules {
    /// Compile naming rules from patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] when a pattern is not a valid regex.
    pub fn new(identifier_pattern: &str, namespace_pattern: &str) -> Result<Self> {
        Ok(Self {
            identifier: compile(identifier_pattern)?,
            namespace: compile(namespace_pattern)?,
        })
    }

    /// Check an entity, property or role name.
    #[must_use]
    pub fn is_valid_identifier(&self, name: &str) -> bool {
        self.identifier.is_match(name)
    }

    /// Check a namespace name.
    #[must_use]
    pub fn is_valid_namespace(&self, name: &str) -> bool {
        self.namespace.is_match(name)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> NamingRules {
        NamingRules::new(DEFAULT_IDENTIFIER_PATTERN, DEFAULT_NAMESPACE_PATTERN).unwrap()
    }

    #[test]
    fn test_identifiers_must_be_pascal_case() {
        let rules = rules();
        assert!(rules.is_valid_identifier("StudentUniqueId"));
        assert!(rules.is_valid_identifier("A1"));
        assert!(!rules.is_valid_identifier("studentUniqueId"));
        assert!(!rules.is_valid_identifier("Student_UniqueId"));
        assert!(!rules.is_valid_identifier(""));
    }

    #[test]
    fn test_namespace_names() {
        let rules = rules();
        assert!(rules.is_valid_namespace("EdFi"));
        assert!(rules.is_valid_namespace("sample"));
        assert!(!rules.is_valid_namespace("1Sample"));
        assert!(!rules.is_valid_namespace("Ed-Fi"));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let error = NamingRules::new("([", DEFAULT_NAMESPACE_PATTERN).unwrap_err();
        match error {
            Error::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(["),
            other => panic!("expected invalid pattern, got {other:?}"),
        }
    }
}
