//! Validation failures for fleet records.
//!
//! A [`ValidationError`] collects every offending field of a rejected payload
//! so the caller can report all of them at once instead of one per attempt.

use std::fmt;

/// A single rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field path in document form (e.g. `non_running_details.explanation`).
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A record payload that was malformed or logically inconsistent.
///
/// Never empty: constructing one always names at least one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    /// Create a validation error for a single field.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    /// All offending fields, in the order they were found.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Names of the offending fields.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    /// Check whether the given field was rejected.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid record: ")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Accumulates field errors while a payload is checked.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reject(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Reject `value` if it is empty or only whitespace.
    pub(crate) fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.reject(field, "must not be empty");
        }
    }

    /// Reject `value` if it is negative or not a finite number.
    pub(crate) fn require_non_negative(&mut self, field: &str, value: f64) {
        if !value.is_finite() {
            self.reject(field, "must be a finite number");
        } else if value < 0.0 {
            self.reject(field, "must not be negative");
        }
    }

    pub(crate) fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_validator_passes() {
        assert!(Validator::new().finish().is_ok());
    }

    #[test]
    fn test_collects_all_fields() {
        let mut v = Validator::new();
        v.require_text("alias", "   ");
        v.require_text("location", "");
        v.require_non_negative("cost", -1.0);

        let err = v.finish().unwrap_err();
        assert_eq!(err.fields(), vec!["alias", "location", "cost"]);
        assert!(err.has_field("cost"));
        assert!(!err.has_field("title"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut v = Validator::new();
        v.require_non_negative("estimated_budget", f64::NAN);
        let err = v.finish().unwrap_err();
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn test_zero_is_non_negative() {
        let mut v = Validator::new();
        v.require_non_negative("cost", 0.0);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_display_lists_every_field() {
        let mut v = Validator::new();
        v.require_text("alias", "");
        v.require_text("location", "");
        let msg = v.finish().unwrap_err().to_string();
        assert_eq!(
            msg,
            "invalid record: alias: must not be empty; location: must not be empty"
        );
    }
}
