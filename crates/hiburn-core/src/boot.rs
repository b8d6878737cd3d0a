//! ---
//! hiburn_section: "01-core-functionality"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Kernel and rootfs placement plus boot argument assembly."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
//! Boot sequence: place the kernel at `mem.base_addr`, the root filesystem on
//! the next `mem.block_size` boundary after it, then `bootm` with a kernel
//! command line that points the initrd at the root filesystem.

use std::fmt;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use hiburn_common::{ConfigError, HostInterface, SizeLiteral};
use hiburn_logging::hb_info;

use crate::action::Action;
use crate::error::ActionError;
use crate::transfer::{TransferError, UploadSpec};

/// Flash partition layout handed to the kernel.
pub const MTDPARTS: &str = "mtdparts=hi_sfc:512k(boot)";

/// Hostname field of the `ip=` kernel parameter.
pub const KERNEL_HOSTNAME: &str = "camera1";

/// Smallest multiple of `block_size` that is `>= value`.
pub fn align_up(block_size: u64, value: u64) -> Result<u64, ConfigError> {
    if block_size == 0 {
        return Err(ConfigError::ZeroBlockSize);
    }
    match value % block_size {
        0 => Ok(value),
        rem => value
            .checked_add(block_size - rem)
            .ok_or(ConfigError::AddressOverflow {
                base: value,
                size: block_size - rem,
            }),
    }
}

/// First block boundary at or after the end of an image of `image_size` bytes at `image_addr`.
pub fn rootfs_address(block_size: u64, image_addr: u64, image_size: u64) -> Result<u64, ConfigError> {
    let end = image_addr
        .checked_add(image_size)
        .ok_or(ConfigError::AddressOverflow {
            base: image_addr,
            size: image_size,
        })?;
    align_up(block_size, end)
}

/// Kernel command line for booting with the root filesystem as initrd.
#[derive(Debug, Clone)]
pub struct KernelCommandLine<'a> {
    pub linux_size: &'a SizeLiteral,
    pub console: &'a str,
    pub device_ip: Ipv4Addr,
    pub host: HostInterface,
    pub rootfs_addr: u64,
    pub initrd_size: &'a SizeLiteral,
}

impl fmt::Display for KernelCommandLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mem={} ", self.linux_size)?;
        write!(f, "console={} ", self.console)?;
        // client:server:gateway:netmask:hostname:device:autoconf
        write!(
            f,
            "ip={}:{}:{}:{}:{}::off; ",
            self.device_ip, self.host.ip, self.host.ip, self.host.netmask, KERNEL_HOSTNAME
        )?;
        write!(f, "{MTDPARTS} ")?;
        write!(
            f,
            "root=/dev/ram0 ro initrd={:#x},{}",
            self.rootfs_addr, self.initrd_size
        )
    }
}

impl Action<'_> {
    /// Upload kernel and root filesystem, set `bootargs`, and `bootm` the kernel.
    ///
    /// Nothing uploaded before a failure is cleaned up.
    pub fn boot(&mut self, uimage: &Path, rootfs: &Path) -> Result<(), ActionError> {
        let mem = &self.config.mem;
        let uimage_addr = mem.base_addr.bytes();
        let uimage_size = image_size(uimage)?;
        let rootfs_addr = rootfs_address(mem.block_size.bytes(), uimage_addr, uimage_size)?;
        hb_info!(
            context = self.log_context("boot"),
            "kernel at {uimage_addr:#x} ({uimage_size} bytes), rootfs at {rootfs_addr:#x}"
        );

        self.configure_network()?;
        self.upload_files(&[
            UploadSpec::new(uimage, uimage_addr),
            UploadSpec::new(rootfs, rootfs_addr),
        ])?;

        let bootargs = KernelCommandLine {
            linux_size: &self.config.mem.linux_size,
            console: &self.config.linux_console,
            device_ip: self.device_ip()?,
            host: self.host_interface()?,
            rootfs_addr,
            initrd_size: &self.config.mem.initrd_size,
        }
        .to_string();
        self.sink
            .info(&format!("Load kernel with bootargs: {bootargs}"));

        self.client.setenv(&[("bootargs", bootargs.as_str())])?;
        self.client
            .bootm(uimage_addr)
            .map_err(ActionError::BootFailure)?;
        self.sink.info("OS seems successfully started");
        Ok(())
    }
}

fn image_size(path: &Path) -> Result<u64, TransferError> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| TransferError::Source {
            path: path.to_path_buf(),
            source,
        })
}
