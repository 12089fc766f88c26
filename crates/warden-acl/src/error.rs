//! Error types for permission resolution

use thiserror::Error;

/// Result type for permission resolution
pub type Result<T> = std::result::Result<T, AclError>;

/// Errors that can occur while resolving permissions
#[derive(Error, Debug)]
pub enum AclError {
    #[error("Invalid operator \"{0}\", available operators are \"and\", \"or\"")]
    InvalidOperator(String),

    #[error("Malformed permission record \"{name}\": {reason}")]
    MalformedRecord { name: String, reason: String },

    #[error("Grant source error: {0}")]
    Source(String),

    #[error("Cache store error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operator_message() {
        let err = AclError::InvalidOperator("xor".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid operator \"xor\", available operators are \"and\", \"or\""
        );
    }

    #[test]
    fn test_malformed_record_message() {
        let err = AclError::MalformedRecord {
            name: "post".to_string(),
            reason: "expected a boolean".to_string(),
        };
        assert!(err.to_string().contains("post"));
        assert!(err.to_string().contains("expected a boolean"));
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<bool>("nope").unwrap_err();
        let err: AclError = json_err.into();
        assert!(matches!(err, AclError::Serialization(_)));
    }
}
