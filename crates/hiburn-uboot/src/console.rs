//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Byte-stream transports for reaching a bootloader console."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

/// A console endpoint: a TCP console server (ser2net and friends) or a
/// character device opened read/write.
#[derive(Debug)]
pub enum Console {
    Tcp(TcpStream),
    Device(DeviceConsole),
}

impl Console {
    /// Endpoints containing `/` are device paths, anything else is `host:port`.
    ///
    /// `timeout` bounds connecting and every read. Device line settings are
    /// expected to be in place already.
    pub fn open(endpoint: &str, timeout: Duration) -> io::Result<Self> {
        if endpoint.contains('/') {
            debug!(endpoint, "opening console device");
            return Ok(Self::Device(DeviceConsole::open(endpoint, timeout)?));
        }

        let mut last_err = None;
        for addr in endpoint.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    debug!(%addr, "connected to console server");
                    return Ok(Self::Tcp(stream));
                }
                Err(err) => {
                    warn!(%addr, error = %err, "console connect attempt failed");
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("console endpoint '{endpoint}' resolved to no address"),
            )
        }))
    }
}

impl Read for Console {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            Self::Device(device) => device.read(buf),
        }
    }
}

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            Self::Device(device) => device.writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            Self::Device(device) => device.writer.flush(),
        }
    }
}

/// Character device console.
///
/// Plain file reads cannot time out, so a reader thread forwards chunks over
/// a channel and reads wait on it for at most `timeout`.
#[derive(Debug)]
pub struct DeviceConsole {
    writer: File,
    chunks: Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    timeout: Duration,
}

impl DeviceConsole {
    fn open(path: &str, timeout: Duration) -> io::Result<Self> {
        let writer = OpenOptions::new().read(true).write(true).open(path)?;
        let mut reader = writer.try_clone()?;
        let (tx, chunks) = mpsc::channel();
        thread::Builder::new()
            .name("console-reader".into())
            .spawn(move || {
                let mut buf = [0u8; 512];
                loop {
                    let chunk = match reader.read(&mut buf) {
                        // dropping the sender reports end of stream
                        Ok(0) => break,
                        Ok(read) => Ok(buf[..read].to_vec()),
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                        Err(err) => Err(err),
                    };
                    let failed = chunk.is_err();
                    if tx.send(chunk).is_err() || failed {
                        break;
                    }
                }
            })?;
        Ok(Self {
            writer,
            chunks,
            pending: Vec::new(),
            timeout,
        })
    }
}

impl Read for DeviceConsole {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.chunks.recv_timeout(self.timeout) {
                Ok(chunk) => self.pending = chunk?,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "no console output before the read timeout",
                    ))
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }
        let read = buf.len().min(self.pending.len());
        buf[..read].copy_from_slice(&self.pending[..read]);
        self.pending.drain(..read);
        Ok(read)
    }
}
