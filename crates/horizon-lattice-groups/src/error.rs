//! Error types for the group model.
//!
//! Only corrupt persisted state and bad configuration are errors. Lookups
//! that find nothing and mutations that do not apply are reported through
//! `Option` and plain return values instead.

/// Result type alias for group model operations.
pub type Result<T> = std::result::Result<T, GroupModelError>;

/// Errors that can occur while restoring or configuring a group model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupModelError {
    /// A state token was not one of its two recognized literals.
    #[error("{value} not one of '{}' or '{}' for {field}", .expected.0, .expected.1)]
    InvalidState {
        field: &'static str,
        value: String,
        expected: (&'static str, &'static str),
    },

    /// A numeric field could not be parsed.
    #[error("Invalid number '{value}' for {field}")]
    InvalidNumber { field: &'static str, value: String },

    /// A group record ended before a required field.
    #[error("Group record '{record}' is missing field {field}")]
    MissingField { record: String, field: &'static str },

    /// A group record has no `name=` prefix.
    #[error("Malformed group record '{0}'")]
    MalformedRecord(String),

    /// The INI document holding the state could not be parsed.
    #[error("INI parse error: {0}")]
    Ini(String),

    /// The TOML configuration could not be parsed or written.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GroupModelError {
    /// Create an invalid state token error.
    pub fn invalid_state(
        field: &'static str,
        value: impl Into<String>,
        expected: (&'static str, &'static str),
    ) -> Self {
        Self::InvalidState {
            field,
            value: value.into(),
            expected,
        }
    }

    /// Create an invalid number error.
    pub fn invalid_number(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            field,
            value: value.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(record: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            record: record.into(),
            field,
        }
    }
}

impl From<ini::ParseError> for GroupModelError {
    fn from(err: ini::ParseError) -> Self {
        Self::Ini(err.to_string())
    }
}

impl From<toml::de::Error> for GroupModelError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GroupModelError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = GroupModelError::invalid_state("collapsed", "folded", ("expanded", "collapsed"));
        assert_eq!(
            err.to_string(),
            "folded not one of 'expanded' or 'collapsed' for collapsed"
        );
    }

    #[test]
    fn test_missing_field_message() {
        let err = GroupModelError::missing_field("A=1:1", "visible_start_position");
        assert_eq!(
            err.to_string(),
            "Group record 'A=1:1' is missing field visible_start_position"
        );
    }
}
