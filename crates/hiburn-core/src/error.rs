//! ---
//! hiburn_section: "01-core-functionality"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Action orchestration for bootloader-console provisioning."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use hiburn_common::ConfigError;
use thiserror::Error;

use crate::client::DeviceError;
use crate::transfer::TransferError;

/// Failure of a provisioning action. Messages of wrapped errors pass through untouched.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("network is unavailable")]
    NetworkUnavailable,
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error(transparent)]
    BootFailure(DeviceError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("missing argument --{0}")]
    MissingArgument(&'static str),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("command '{0}' is already registered")]
    DuplicateCommand(&'static str),
    #[error(transparent)]
    Action(#[from] ActionError),
}
