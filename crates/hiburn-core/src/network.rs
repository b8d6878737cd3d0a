//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Device network configuration derived from provisioning config."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use tracing::debug;

use crate::action::Action;
use crate::error::ActionError;

/// Suffix the bootloader prints on the last ping line when the host answered.
pub const ALIVE_SUFFIX: &str = "is alive";

/// True when the last response line ends with [`ALIVE_SUFFIX`].
pub fn response_is_alive(lines: &[String]) -> bool {
    lines
        .last()
        .is_some_and(|line| line.ends_with(ALIVE_SUFFIX))
}

impl Action<'_> {
    /// Push `ipaddr`, `netmask` and `serverip` to the device in one write.
    ///
    /// Safe to repeat; later calls overwrite the same three variables.
    pub fn configure_network(&mut self) -> Result<(), ActionError> {
        let host = self.host_interface()?;
        let ipaddr = self.device_ip()?.to_string();
        let netmask = host.netmask.to_string();
        let serverip = host.ip.to_string();
        debug!(%ipaddr, %netmask, %serverip, "configuring device network");
        self.client.setenv(&[
            ("ipaddr", ipaddr.as_str()),
            ("netmask", netmask.as_str()),
            ("serverip", serverip.as_str()),
        ])?;
        Ok(())
    }

    /// Configure the network and check that the device can reach the host.
    pub fn ping(&mut self) -> Result<(), ActionError> {
        self.configure_network()?;
        let host = self.host_interface()?;
        let response = self.client.ping(host.ip)?;
        if !response_is_alive(&response) {
            debug!(last = ?response.last(), "ping response without alive marker");
            return Err(ActionError::NetworkUnavailable);
        }
        Ok(())
    }
}
