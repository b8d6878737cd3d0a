//! ---
//! hiburn_section: "01-core-functionality"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Shared primitives for provisioning configuration."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::net::AddrParseError;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Malformed or missing provisioning configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration files found. inspected: {inspected}")]
    NotFound { inspected: String },
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid size '{value}': {reason}")]
    InvalidSize { value: String, reason: &'static str },
    #[error("invalid IP address '{value}': {source}")]
    InvalidAddress {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("invalid host interface '{value}': {reason}")]
    InvalidInterface { value: String, reason: &'static str },
    #[error("mem.block_size must be greater than zero")]
    ZeroBlockSize,
    #[error("address {base:#x} + {size:#x} does not fit in 64 bits")]
    AddressOverflow { base: u64, size: u64 },
}
