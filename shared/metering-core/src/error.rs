//! Error types for metering services

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeteringError>;

#[derive(Error, Debug)]
pub enum MeteringError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MeteringError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<std::io::Error> for MeteringError {
    fn from(err: std::io::Error) -> Self {
        MeteringError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MeteringError::validation("bad").status_code(), 400);
        assert_eq!(MeteringError::NotFound("x".into()).status_code(), 404);
        assert_eq!(MeteringError::Database("down".into()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(MeteringError::validation("bad").error_code(), "VALIDATION_ERROR");
        assert_eq!(MeteringError::Database("x".into()).error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_display_includes_message() {
        let err = MeteringError::NotFound("channel 42".into());
        assert_eq!(err.to_string(), "Not found: channel 42");
    }
}
