//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "One-shot TFTP server for device memory transfers."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::io;
use std::path::PathBuf;

use hiburn_core::TransferError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TftpError {
    #[error("tftp socket error: {0}")]
    Io(#[from] io::Error),
    #[error("no answer from the device for '{file}'")]
    Timeout { file: String },
    #[error("transfer cancelled")]
    Cancelled,
    #[error("peer sent error {code}: {message}")]
    Remote { code: u16, message: String },
    #[error("peer asked for '{requested}', expected '{expected}'")]
    UnexpectedFile { requested: String, expected: String },
    #[error("malformed packet: {0}")]
    Malformed(&'static str),
    #[error("unexpected {0} packet")]
    UnexpectedPacket(&'static str),
    #[error("unsupported transfer mode '{0}'")]
    UnsupportedMode(String),
    #[error("unable to read {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to write {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<TftpError> for TransferError {
    fn from(err: TftpError) -> Self {
        match err {
            TftpError::Io(source) => TransferError::Socket(source),
            TftpError::Timeout { file } => TransferError::Timeout { file },
            TftpError::Remote { code, message } => TransferError::Remote { code, message },
            TftpError::UnexpectedFile {
                requested,
                expected,
            } => TransferError::UnexpectedFile {
                requested,
                expected,
            },
            TftpError::Source { path, source } => TransferError::Source { path, source },
            TftpError::Destination { path, source } => {
                TransferError::Destination { path, source }
            }
            other @ (TftpError::Cancelled
            | TftpError::Malformed(_)
            | TftpError::UnexpectedPacket(_)
            | TftpError::UnsupportedMode(_)) => TransferError::Protocol(other.to_string()),
        }
    }
}
