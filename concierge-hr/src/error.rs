use concierge_core::ConciergeError;
use std::fmt;

/// A configuration value that is missing or malformed, with a hint on how
/// to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into(), suggestion: None }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

/// Why generated SQL was refused before reaching the database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlGuardError {
    #[error("Only SELECT queries allowed")]
    NotSelect,

    #[error("Unsafe SQL detected: {0}")]
    ForbiddenKeyword(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HrError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    UnsafeSql(#[from] SqlGuardError),

    #[error(transparent)]
    Model(#[from] ConciergeError),

    #[error("The model returned an empty {0}")]
    EmptyCompletion(&'static str),
}

impl HrError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config(ConfigError::new(field, message))
    }

    /// True when the failure came from the SQL guard rather than from an
    /// external system.
    pub fn is_rejected_sql(&self) -> bool {
        matches!(self, Self::UnsafeSql(_))
    }
}

pub type Result<T> = std::result::Result<T, HrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_includes_suggestion() {
        let err = ConfigError::new("GROQ_API_KEY", "not set")
            .with_suggestion("Add GROQ_API_KEY to your .env file");
        assert_eq!(err.to_string(), "GROQ_API_KEY: not set. Add GROQ_API_KEY to your .env file");
    }

    #[test]
    fn guard_errors_surface_unchanged() {
        let err: HrError = SqlGuardError::ForbiddenKeyword("drop".to_string()).into();
        assert_eq!(err.to_string(), "Unsafe SQL detected: drop");
        assert!(err.is_rejected_sql());

        let err: HrError = SqlGuardError::NotSelect.into();
        assert_eq!(err.to_string(), "Only SELECT queries allowed");
    }

    #[test]
    fn model_errors_convert() {
        let err: HrError = ConciergeError::Model("rate limited".to_string()).into();
        assert!(matches!(err, HrError::Model(_)));
        assert!(!err.is_rejected_sql());
    }
}
