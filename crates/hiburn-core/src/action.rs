//! ---
//! hiburn_section: "01-core-functionality"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Action orchestration for bootloader-console provisioning."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::net::Ipv4Addr;

use hiburn_common::{HostInterface, ProvisionConfig};
use hiburn_logging::LogContext;

use crate::client::DeviceClient;
use crate::error::ActionError;
use crate::sink::OutputSink;
use crate::transfer::FileTransfer;

/// Handler state for a single dispatched command.
///
/// Everything is borrowed; nothing outlives the invocation. Network, transfer
/// and boot operations are implemented in their own modules on this type.
pub struct Action<'a> {
    pub(crate) client: &'a mut dyn DeviceClient,
    pub(crate) transfer: &'a dyn FileTransfer,
    pub(crate) config: &'a ProvisionConfig,
    pub(crate) sink: &'a mut dyn OutputSink,
    device: Option<&'a str>,
}

impl<'a> Action<'a> {
    pub fn new(
        client: &'a mut dyn DeviceClient,
        transfer: &'a dyn FileTransfer,
        config: &'a ProvisionConfig,
        sink: &'a mut dyn OutputSink,
    ) -> Self {
        Self {
            client,
            transfer,
            config,
            sink,
            device: None,
        }
    }

    /// Console endpoint reported as the `device` field of log events.
    pub fn with_device(mut self, endpoint: &'a str) -> Self {
        self.device = Some(endpoint);
        self
    }

    /// Log context naming this action's device and `action`.
    pub fn log_context(&self, action: &'a str) -> LogContext<'a> {
        let ctx = LogContext::new().with_action(action);
        match self.device {
            Some(device) => ctx.with_device(device),
            None => ctx,
        }
    }

    pub fn config(&self) -> &ProvisionConfig {
        self.config
    }

    /// Host address and netmask, parsed from `net.host` on every call.
    pub fn host_interface(&self) -> Result<HostInterface, ActionError> {
        Ok(self.config.host_interface()?)
    }

    /// Device address, parsed from `net.target` on every call.
    pub fn device_ip(&self) -> Result<Ipv4Addr, ActionError> {
        Ok(self.config.device_ip()?)
    }

    /// Print the device environment, one variable per line.
    pub fn printenv(&mut self) -> Result<(), ActionError> {
        let lines = self.client.printenv()?;
        for line in &lines {
            self.sink.line(line);
        }
        Ok(())
    }
}
