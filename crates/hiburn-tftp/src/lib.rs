//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "One-shot TFTP server for device memory transfers."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
//! Octet-mode TFTP with 512-byte blocks. The server answers exactly the
//! request it was told to expect; the device side is driven through the
//! bootloader console with `tftpboot` and `tftpput`.

pub mod error;
pub mod packet;
pub mod server;
pub mod transfer;

pub use error::TftpError;
pub use packet::{ErrorCode, Packet, BLOCK_SIZE};
pub use server::TftpServer;
pub use transfer::TftpTransfer;
