use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(#[from] ValidationErrors),
    #[error("File too large ({size} bytes). Max size is 2MB.")]
    AttachmentTooLarge { size: u64, limit: u64 },
    #[error("Failed to load logo: {0}")]
    LogoError(String),
    #[error("Failed to load config: {0}")]
    ConfigError(String),
    #[error("Missing value for {0} (pass it on the command line or set it in the config)")]
    MissingField(&'static str),
    #[error("Unknown plan '{0}' (expected 1, 3, 6 or 12)")]
    UnknownPlan(String),
    #[error("Invalid date: {0}")]
    DateError(String),
    #[error("Failed to create PDF: {0}")]
    PdfError(String),
    #[error("Failed to encode layout: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Form fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    PhoneNumber,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::PhoneNumber => "phoneNumber",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field -> message map produced by validation. Never empty when returned as an error.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_display_lists_each_field() {
        let mut errors = ValidationErrors::new();
        errors.add(Field::PhoneNumber, "Phone number must contain at least 10 digits.");

        assert_eq!(
            errors.to_string(),
            "phoneNumber: Phone number must contain at least 10 digits."
        );
    }

    #[test]
    fn test_attachment_too_large_message() {
        let err = AppError::AttachmentTooLarge { size: 3_000_000, limit: 2_097_152 };
        assert!(err.to_string().contains("Max size is 2MB"));
    }
}
