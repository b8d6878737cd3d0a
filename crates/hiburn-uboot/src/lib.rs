//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "U-Boot console client over byte streams."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
//! Talks to a U-Boot console one command at a time: write the command line,
//! read until the prompt comes back, and hand the lines in between to the
//! caller.

mod client;
mod console;

use std::time::Duration;

use hiburn_core::DeviceError;

pub use client::{UBootClient, BOOT_MARKER, DEFAULT_PROMPT};
pub use console::{Console, DeviceConsole};

/// Open `endpoint` and wait for the first prompt.
///
/// `endpoint` is either `host:port` of a TCP console server or a path to a
/// character device.
pub fn connect(
    endpoint: &str,
    prompt: &str,
    timeout: Duration,
) -> Result<UBootClient<Console>, DeviceError> {
    let console = Console::open(endpoint, timeout)?;
    let mut client = UBootClient::new(console, prompt).with_endpoint(endpoint);
    client.attach()?;
    Ok(client)
}
