use std::net::SocketAddr;

use crate::{config::models::ProxyConfig, core::target::TargetDescriptor};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Proxy configuration validator
pub struct ProxyConfigValidator;

impl ProxyConfigValidator {
    /// Validate the entire configuration, reporting every problem at once
    pub fn validate(config: &ProxyConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_target(&config.target) {
            errors.push(e);
        }

        if config.limits.max_request_body_bytes == 0 {
            errors.push(ValidationError::InvalidField {
                field: "limits.max_request_body_bytes".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if config.limits.max_response_body_bytes == 0 {
            errors.push(ValidationError::InvalidField {
                field: "limits.max_response_body_bytes".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if config.logging.level.trim().is_empty() {
            errors.push(ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            }),
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// The target must resolve exactly as it will at startup
    fn validate_target(target: &str) -> ValidationResult<()> {
        TargetDescriptor::resolve(target)
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidTarget {
                target: target.to_string(),
                reason: e.to_string(),
            })
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        errors
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}", i + 1, e))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::BodyLimits;

    fn valid_config() -> ProxyConfig {
        ProxyConfig::builder()
            .listen_addr("127.0.0.1:3000")
            .target("https://httpbin.org")
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_config() {
        assert!(ProxyConfigValidator::validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_invalid_listen_address() {
        let mut config = valid_config();
        config.listen_addr = "localhost".to_string();
        assert!(matches!(
            ProxyConfigValidator::validate(&config),
            Err(ValidationError::InvalidListenAddress { .. })
        ));
    }

    #[test]
    fn test_invalid_target() {
        let mut config = valid_config();
        config.target = "ftp://files.example.com".to_string();
        assert!(matches!(
            ProxyConfigValidator::validate(&config),
            Err(ValidationError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_collects_multiple_errors() {
        let mut config = valid_config();
        config.target = String::new();
        config.limits = BodyLimits {
            max_request_body_bytes: 0,
            max_response_body_bytes: 0,
        };

        match ProxyConfigValidator::validate(&config) {
            Err(ValidationError::ValidationFailed { message }) => {
                assert!(message.contains("1. Invalid target"));
                assert!(message.contains("max_request_body_bytes"));
                assert!(message.contains("max_response_body_bytes"));
            }
            other => panic!("Expected ValidationFailed, got {other:?}"),
        }
    }
}
