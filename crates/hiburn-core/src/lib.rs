//! ---
//! hiburn_section: "01-core-functionality"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Action orchestration for bootloader-console provisioning."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
//! Provisioning actions driven through a bootloader console.
//!
//! An [`Action`] borrows the device client, the transfer collaborator, the
//! configuration, and an output sink for the duration of one command. The
//! [`CommandRegistry`] maps command names to the handlers that run it.

pub mod action;
pub mod boot;
pub mod client;
pub mod commands;
pub mod error;
pub mod network;
pub mod sink;
pub mod transfer;

pub use action::Action;
pub use boot::{align_up, rootfs_address, KernelCommandLine};
pub use client::{DeviceClient, DeviceError};
pub use commands::{CommandDescriptor, CommandRegistry};
pub use error::{ActionError, DispatchError};
pub use network::response_is_alive;
pub use sink::{OutputSink, StdoutSink};
pub use transfer::{DownloadSpec, FileTransfer, TransferError, UploadSpec};
