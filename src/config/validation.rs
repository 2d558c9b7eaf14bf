//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and addresses
//! - Validate value ranges (timeouts > 0, replica >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: UploaderConfig → Result<(), Vec<ValidationError>>
//! - Runs before any client is constructed

use std::fmt;

use alloy::primitives::Address;

use crate::config::schema::{ConnectionMode, UploaderConfig};
use crate::storage::rpc::parse_endpoint;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `network.evm_rpc_url`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &UploaderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let network = &config.network;

    check_url(&mut errors, "network.evm_rpc_url", &network.evm_rpc_url);
    check_url(&mut errors, "network.gateway_url", &network.gateway_url);

    match network.mode {
        ConnectionMode::Indexer => {
            check_url(&mut errors, "network.indexer_url", &network.indexer_url);
        }
        ConnectionMode::Node => {
            if network.storage_nodes.is_empty() {
                errors.push(ValidationError::new(
                    "network.storage_nodes",
                    "node mode requires at least one storage node",
                ));
            }
        }
    }
    for (i, url) in network.storage_nodes.iter().enumerate() {
        check_url(&mut errors, &format!("network.storage_nodes[{}]", i), url);
    }

    if let Some(addr) = &network.flow_address {
        if addr.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                "network.flow_address",
                format!("'{}' is not a 20-byte hex address", addr),
            ));
        }
    }

    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be greater than 0"));
    }

    let upload = &config.upload;
    if upload.timeout_secs == 0 {
        errors.push(ValidationError::new("upload.timeout_secs", "must be greater than 0"));
    }
    if upload.expected_replica == 0 {
        errors.push(ValidationError::new("upload.expected_replica", "must be at least 1"));
    }
    if upload.segments_per_request == 0 {
        errors.push(ValidationError::new("upload.segments_per_request", "must be at least 1"));
    }

    let payload = &config.payload;
    if payload.file_name.trim().is_empty() {
        errors.push(ValidationError::new("payload.file_name", "must not be empty"));
    } else if payload.file_name.contains(['/', '\\']) || payload.file_name == ".." {
        errors.push(ValidationError::new(
            "payload.file_name",
            "must be a bare file name without path separators",
        ));
    }
    if payload.content.is_empty() {
        errors.push(ValidationError::new("payload.content", "must not be empty"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error" | "off") {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, url: &str) {
    if let Err(e) = parse_endpoint(url) {
        errors.push(ValidationError::new(field, e.to_string()));
    }
}
