//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, addresses parseable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: FaultConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::FaultConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Bind address does not parse as a socket address.
    InvalidBindAddress(String),
    /// Connection limit must allow at least one connection.
    ZeroMaxConnections,
    /// The monitor must poll; a zero interval busy-loops.
    ZeroPollInterval,
    /// The failing endpoint needs a payload to write.
    ZeroPayload,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "invalid bind address '{}'", addr)
            }
            ValidationError::ZeroMaxConnections => {
                write!(f, "listener.max_connections must be at least 1")
            }
            ValidationError::ZeroPollInterval => {
                write!(f, "race.poll_interval_ms must be at least 1")
            }
            ValidationError::ZeroPayload => {
                write!(f, "race.payload_bytes must be at least 1")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &FaultConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.race.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }
    if config.race.payload_bytes == 0 {
        errors.push(ValidationError::ZeroPayload);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&FaultConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = FaultConfig::default();
        config.listener.bind_address = "nope".to_string();
        config.listener.max_connections = 0;
        config.race.poll_interval_ms = 0;
        config.race.payload_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroPollInterval));
    }
}
