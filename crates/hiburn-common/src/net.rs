//! ---
//! hiburn_section: "01-core-functionality"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Shared primitives for provisioning configuration."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::fmt;
use std::net::Ipv4Addr;

use crate::error::{ConfigError, Result};

/// Host address as seen from the device, with the netmask of its subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostInterface {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl HostInterface {
    /// Parse `ADDR/PREFIX`, `ADDR/NETMASK`, or a bare `ADDR` (treated as `/32`).
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let (addr, mask) = match value.split_once('/') {
            Some((addr, mask)) => (addr, Some(mask)),
            None => (value, None),
        };
        let ip = parse_ipv4(addr)?;
        let netmask = match mask {
            None => Ipv4Addr::BROADCAST,
            Some(mask) if mask.contains('.') => {
                let netmask = parse_ipv4(mask)?;
                let bits = u32::from(netmask);
                if bits.leading_ones() + bits.trailing_zeros() != 32 {
                    return Err(ConfigError::InvalidInterface {
                        value: value.to_owned(),
                        reason: "netmask bits are not contiguous",
                    });
                }
                netmask
            }
            Some(prefix) => {
                let prefix: u32 = prefix.parse().map_err(|_| ConfigError::InvalidInterface {
                    value: value.to_owned(),
                    reason: "prefix length is not a number",
                })?;
                if prefix > 32 {
                    return Err(ConfigError::InvalidInterface {
                        value: value.to_owned(),
                        reason: "prefix length exceeds 32",
                    });
                }
                Ipv4Addr::from(u32::MAX.checked_shl(32 - prefix).unwrap_or(0))
            }
        };
        Ok(Self { ip, netmask })
    }

    pub fn prefix_len(&self) -> u32 {
        u32::from(self.netmask).leading_ones()
    }
}

impl fmt::Display for HostInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len())
    }
}

/// Parse the device address from `net.target`.
pub fn parse_device_address(value: &str) -> Result<Ipv4Addr> {
    parse_ipv4(value)
}

fn parse_ipv4(value: &str) -> Result<Ipv4Addr> {
    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidAddress {
            value: value.to_owned(),
            source,
        })
}
