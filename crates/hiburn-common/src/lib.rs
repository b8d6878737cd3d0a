//! ---
//! hiburn_section: "01-core-functionality"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Shared primitives for provisioning configuration."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
//! Shared primitives for the hiburn workspace.
//! This crate exposes the provisioning configuration model, size literal
//! parsing, and the host/device network parameters derived from it.

pub mod config;
pub mod error;
pub mod net;
pub mod size;

pub use config::{
    ConsoleConfig, LoadedConfig, LoggingConfig, MemConfig, NetConfig, ProvisionConfig, TftpConfig,
};
pub use error::ConfigError;
pub use net::{parse_device_address, HostInterface};
pub use size::{parse_size, SizeLiteral};
