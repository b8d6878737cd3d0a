//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Transfer orchestration between host files and device memory."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::action::Action;
use crate::client::{DeviceClient, DeviceError};
use crate::error::ActionError;

/// A host file to be placed at `addr` in device memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSpec {
    pub path: PathBuf,
    pub addr: u64,
}

impl UploadSpec {
    pub fn new(path: impl Into<PathBuf>, addr: u64) -> Self {
        Self {
            path: path.into(),
            addr,
        }
    }
}

/// `size` bytes of device memory starting at `addr`, written to `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSpec {
    pub path: PathBuf,
    pub addr: u64,
    pub size: u64,
}

impl DownloadSpec {
    pub fn new(path: impl Into<PathBuf>, addr: u64, size: u64) -> Self {
        Self {
            path: path.into(),
            addr,
            size,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("unable to read {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to write {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("transfer socket error: {0}")]
    Socket(#[source] std::io::Error),
    #[error("timed out waiting for the device while transferring {file}")]
    Timeout { file: String },
    #[error("device reported transfer error {code}: {message}")]
    Remote { code: u16, message: String },
    #[error("device requested '{requested}' while '{expected}' was offered")]
    UnexpectedFile { requested: String, expected: String },
    #[error("transfer protocol violation: {0}")]
    Protocol(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Moves whole batches between host files and device memory.
///
/// Both calls block until every entry of the batch has been transferred,
/// in listed order, or the first failure occurs.
pub trait FileTransfer {
    fn upload_files(
        &self,
        client: &mut dyn DeviceClient,
        batch: &[UploadSpec],
        listen_ip: Ipv4Addr,
    ) -> Result<(), TransferError>;

    fn download_files(
        &self,
        client: &mut dyn DeviceClient,
        batch: &[DownloadSpec],
        listen_ip: Ipv4Addr,
    ) -> Result<(), TransferError>;
}

impl Action<'_> {
    /// Upload `batch` with the host interface as listen address.
    ///
    /// The network must already be configured by the calling action.
    pub fn upload_files(&mut self, batch: &[UploadSpec]) -> Result<(), ActionError> {
        let listen_ip = self.host_interface()?.ip;
        debug!(entries = batch.len(), %listen_ip, "uploading batch");
        self.transfer
            .upload_files(&mut *self.client, batch, listen_ip)?;
        Ok(())
    }

    /// Download `batch` with the host interface as listen address.
    pub fn download_files(&mut self, batch: &[DownloadSpec]) -> Result<(), ActionError> {
        let listen_ip = self.host_interface()?.ip;
        debug!(entries = batch.len(), %listen_ip, "downloading batch");
        self.transfer
            .download_files(&mut *self.client, batch, listen_ip)?;
        Ok(())
    }

    /// Configure the network, then upload one file to `addr`.
    pub fn upload(&mut self, src: &Path, addr: u64) -> Result<(), ActionError> {
        self.configure_network()?;
        self.upload_files(&[UploadSpec::new(src, addr)])
    }

    /// Configure the network, then dump `size` bytes at `addr` into `dst`.
    pub fn download(&mut self, dst: &Path, addr: u64, size: u64) -> Result<(), ActionError> {
        self.configure_network()?;
        self.download_files(&[DownloadSpec::new(dst, addr, size)])
    }
}
