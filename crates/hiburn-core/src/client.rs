//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Device console capabilities consumed by provisioning actions."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::net::Ipv4Addr;

use thiserror::Error;

/// Failures raised by a console client.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("console I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("console closed before the prompt appeared")]
    Closed,
    #[error("timed out waiting for the console prompt")]
    Timeout,
    #[error("device rejected `{command}`: {output}")]
    Rejected { command: String, output: String },
}

/// One exclusive, blocking channel to a bootloader console.
///
/// Every call returns only once the device has answered (or failed).
pub trait DeviceClient {
    /// Read every environment line (`name=value`).
    fn printenv(&mut self) -> Result<Vec<String>, DeviceError>;

    /// Write the given variables, in order.
    fn setenv(&mut self, vars: &[(&str, &str)]) -> Result<(), DeviceError>;

    /// Ping `addr` from the device and return the raw response lines.
    fn ping(&mut self, addr: Ipv4Addr) -> Result<Vec<String>, DeviceError>;

    /// Boot the image loaded at `addr`.
    fn bootm(&mut self, addr: u64) -> Result<(), DeviceError>;

    /// Run an arbitrary console command and return its output lines.
    fn run(&mut self, command: &str) -> Result<Vec<String>, DeviceError>;
}
