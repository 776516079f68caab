//! Error types for the MoySklad API client configuration.
//!
//! This module contains error types used when building a
//! [`MoyskladConfig`](crate::MoyskladConfig) and its validated newtypes.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use moysklad_api::{ConfigError, Login};
//!
//! let result = Login::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyLogin)));
//! ```

use thiserror::Error;

/// Errors that can occur during client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Login cannot be empty.
    #[error("Login cannot be empty. Please provide a valid MoySklad login (e.g. 'admin@company').")]
    EmptyLogin,

    /// Password cannot be empty.
    #[error("Password cannot be empty. Please provide the password for the MoySklad account.")]
    EmptyPassword,

    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Please provide a URL with scheme (e.g., 'https://api.moysklad.ru/api/remap/1.2').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A page size ceiling is out of range.
    #[error("Invalid value {value} for '{field}'. Page size ceilings must be greater than zero.")]
    InvalidQueryLimit {
        /// The name of the offending setting.
        field: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_login_error_message() {
        let message = ConfigError::EmptyLogin.to_string();
        assert!(message.contains("Login cannot be empty"));
    }

    #[test]
    fn test_invalid_base_url_error_message() {
        let error = ConfigError::InvalidBaseUrl {
            url: "ftp://nope".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("ftp://nope"));
        assert!(message.contains("scheme"));
    }

    #[test]
    fn test_invalid_query_limit_error_message() {
        let error = ConfigError::InvalidQueryLimit {
            field: "entities_query_limit_max",
            value: 0,
        };
        let message = error.to_string();
        assert!(message.contains("entities_query_limit_max"));
        assert!(message.contains("greater than zero"));
    }

    #[test]
    fn test_missing_required_field_error_message() {
        let error = ConfigError::MissingRequiredField { field: "login" };
        let message = error.to_string();
        assert!(message.contains("login"));
        assert!(message.contains("must be set"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyPassword;
        let _: &dyn std::error::Error = &error;
    }
}
