//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Batch transfers driven through the bootloader console."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::fs::{self, OpenOptions};
use std::net::Ipv4Addr;
use std::path::Path;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use hiburn_common::TftpConfig;
use hiburn_core::{DeviceClient, DownloadSpec, FileTransfer, TransferError, UploadSpec};
use tracing::info;

use crate::error::TftpError;
use crate::server::TftpServer;

/// Port the bootloader uses unless `tftpdstp` says otherwise.
pub const STANDARD_PORT: u16 = 69;

/// [`FileTransfer`] backed by a TFTP server on the host.
///
/// The device is told to fetch or push each entry with `tftpboot` or
/// `tftpput` while the server answers on a scoped thread.
#[derive(Debug, Clone)]
pub struct TftpTransfer {
    port: u16,
    timeout: Duration,
    retries: u32,
}

impl TftpTransfer {
    pub fn new(config: &TftpConfig) -> Self {
        Self {
            port: config.port,
            timeout: config.timeout,
            retries: config.retries,
        }
    }

    /// Bind the batch's server and point the device at it.
    fn start(
        &self,
        client: &mut dyn DeviceClient,
        listen_ip: Ipv4Addr,
    ) -> Result<TftpServer, TransferError> {
        let server = TftpServer::bind(listen_ip, self.port, self.timeout, self.retries)?;
        let port = server.local_addr()?.port();
        if port != STANDARD_PORT {
            client.setenv(&[("tftpdstp", port.to_string().as_str())])?;
        }
        Ok(server)
    }
}

impl FileTransfer for TftpTransfer {
    fn upload_files(
        &self,
        client: &mut dyn DeviceClient,
        batch: &[UploadSpec],
        listen_ip: Ipv4Addr,
    ) -> Result<(), TransferError> {
        let mut staged = Vec::with_capacity(batch.len());
        for spec in batch {
            let data = fs::read(&spec.path).map_err(|source| TransferError::Source {
                path: spec.path.clone(),
                source,
            })?;
            staged.push((spec, remote_name(&spec.path), Bytes::from(data)));
        }

        let server = self.start(client, listen_ip)?;
        for (spec, name, data) in staged {
            let command = format!("tftpboot {:#x} {name}", spec.addr);
            let sent = drive(client, &server, &command, |server| server.serve_read(&name, data))?;
            info!(
                file = %spec.path.display(),
                addr = %format!("{:#x}", spec.addr),
                bytes = sent,
                "uploaded"
            );
        }
        Ok(())
    }

    fn download_files(
        &self,
        client: &mut dyn DeviceClient,
        batch: &[DownloadSpec],
        listen_ip: Ipv4Addr,
    ) -> Result<(), TransferError> {
        let server = self.start(client, listen_ip)?;
        for spec in batch {
            let name = remote_name(&spec.path);
            // fail on an unwritable destination before the device starts sending,
            // leaving any existing contents alone until the data is in
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&spec.path)
                .map_err(|source| TransferError::Destination {
                    path: spec.path.clone(),
                    source,
                })?;
            let command = format!("tftpput {:#x} {:#x} {name}", spec.addr, spec.size);
            let data = drive(client, &server, &command, |server| server.serve_write(&name))?;
            fs::write(&spec.path, &data).map_err(|source| TransferError::Destination {
                path: spec.path.clone(),
                source,
            })?;
            info!(
                file = %spec.path.display(),
                addr = %format!("{:#x}", spec.addr),
                bytes = data.len(),
                "downloaded"
            );
        }
        Ok(())
    }
}

/// Run `serve` on a scoped thread while `command` runs on the console.
///
/// A failed console command cancels the server. A server failure that names
/// a cause (wrong file, peer error) is reported ahead of the console's; a
/// server that only timed out or was cancelled defers to the console error.
fn drive<T, F>(
    client: &mut dyn DeviceClient,
    server: &TftpServer,
    command: &str,
    serve: F,
) -> Result<T, TransferError>
where
    T: Send,
    F: FnOnce(&TftpServer) -> Result<T, TftpError> + Send,
{
    server.rearm();
    let (served, console) = thread::scope(|scope| {
        let serving = scope.spawn(move || serve(server));
        let console = client.run(command);
        if console.is_err() {
            server.cancel();
        }
        (serving.join(), console)
    });
    let served = match served {
        Ok(served) => served,
        Err(panic) => std::panic::resume_unwind(panic),
    };
    match (served, console) {
        (Ok(served), Ok(_)) => Ok(served),
        (Err(TftpError::Timeout { .. } | TftpError::Cancelled), Err(console)) => {
            Err(console.into())
        }
        (Err(err), _) => Err(err.into()),
        (Ok(_), Err(console)) => Err(console.into()),
    }
}

/// File name announced to the device for `path`.
fn remote_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
