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
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::TftpError;
use crate::packet::{ErrorCode, Packet, BLOCK_SIZE, RECV_BUFFER};

/// How often a waiting server checks whether it was cancelled.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Listens on one address and serves one request per call.
///
/// Each accepted request is answered from a fresh ephemeral socket, so the
/// listening socket can be reused for the next entry of a batch.
#[derive(Debug)]
pub struct TftpServer {
    socket: UdpSocket,
    timeout: Duration,
    retries: u32,
    cancelled: AtomicBool,
}

impl TftpServer {
    pub fn bind(ip: Ipv4Addr, port: u16, timeout: Duration, retries: u32) -> Result<Self, TftpError> {
        let socket = UdpSocket::bind(SocketAddrV4::new(ip, port))?;
        socket.set_read_timeout(Some(timeout.min(POLL_INTERVAL)))?;
        debug!(addr = %socket.local_addr()?, "tftp server listening");
        Ok(Self {
            socket,
            timeout,
            retries,
            cancelled: AtomicBool::new(false),
        })
    }

    /// Make the call currently serving, if any, give up with
    /// [`TftpError::Cancelled`] at its next timeout.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clear an earlier [`cancel`](Self::cancel) before the next request.
    pub fn rearm(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TftpError> {
        Ok(self.socket.local_addr()?)
    }

    /// Answer one read request for `expected` with `data`. Returns bytes sent.
    pub fn serve_read(&self, expected: &str, data: Bytes) -> Result<u64, TftpError> {
        let (peer, _mode) = self.accept(expected, true)?;
        let session = self.session(peer)?;

        let mut block: u16 = 1;
        let mut offset = 0;
        loop {
            let end = (offset + BLOCK_SIZE).min(data.len());
            let packet = Packet::Data {
                block,
                payload: data.slice(offset..end),
            }
            .encode();
            self.send_until_acked(&session, &packet, block, expected)?;
            // a short (possibly empty) block ends the transfer
            if end - offset < BLOCK_SIZE {
                break;
            }
            offset = end;
            block = block.wrapping_add(1);
        }
        debug!(file = expected, bytes = data.len(), "tftp read served");
        Ok(data.len() as u64)
    }

    /// Accept one write request for `expected` and collect the uploaded bytes.
    pub fn serve_write(&self, expected: &str) -> Result<Bytes, TftpError> {
        let (peer, _mode) = self.accept(expected, false)?;
        let session = self.session(peer)?;

        let mut received = BytesMut::new();
        let mut last_ack = Packet::Ack { block: 0 }.encode();
        session.send(&last_ack)?;
        let mut expected_block: u16 = 1;
        let mut attempts = 0;
        let mut buf = [0u8; RECV_BUFFER];
        loop {
            let len = match session.recv(&mut buf) {
                Ok(len) => len,
                Err(err) if is_timeout(&err) => {
                    if self.is_cancelled() {
                        return Err(TftpError::Cancelled);
                    }
                    attempts += 1;
                    if attempts > self.retries {
                        return Err(TftpError::Timeout {
                            file: expected.to_owned(),
                        });
                    }
                    warn!(file = expected, attempts, "tftp data timed out, resending ack");
                    session.send(&last_ack)?;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            match Packet::decode(&buf[..len])? {
                Packet::Data { block, payload } if block == expected_block => {
                    attempts = 0;
                    received.extend_from_slice(&payload);
                    last_ack = Packet::Ack { block }.encode();
                    session.send(&last_ack)?;
                    if payload.len() < BLOCK_SIZE {
                        break;
                    }
                    expected_block = expected_block.wrapping_add(1);
                }
                // duplicate of the previous block: our ack was lost
                Packet::Data { .. } => {
                    session.send(&last_ack)?;
                }
                Packet::Error { code, message } => {
                    return Err(TftpError::Remote { code, message })
                }
                other => return Err(TftpError::UnexpectedPacket(other.kind())),
            };
        }
        debug!(file = expected, bytes = received.len(), "tftp write received");
        Ok(received.freeze())
    }

    /// Wait for the initial request and check it names `expected`.
    fn accept(&self, expected: &str, read: bool) -> Result<(SocketAddr, String), TftpError> {
        let mut buf = [0u8; RECV_BUFFER];
        let patience = self.timeout.saturating_mul(self.retries.saturating_add(1));
        let started = Instant::now();
        let (len, peer) = loop {
            match self.socket.recv_from(&mut buf) {
                Ok(received) => break received,
                Err(err) if is_timeout(&err) => {
                    if self.is_cancelled() {
                        return Err(TftpError::Cancelled);
                    }
                    if started.elapsed() >= patience {
                        return Err(TftpError::Timeout {
                            file: expected.to_owned(),
                        });
                    }
                }
                Err(err) => return Err(err.into()),
            }
        };

        let (filename, mode) = match (Packet::decode(&buf[..len])?, read) {
            (Packet::ReadRequest { filename, mode }, true)
            | (Packet::WriteRequest { filename, mode }, false) => (filename, mode),
            (other, _) => {
                self.reject(peer, ErrorCode::IllegalOperation, "Illegal TFTP operation");
                return Err(TftpError::UnexpectedPacket(other.kind()));
            }
        };
        debug!(%peer, %filename, %mode, "tftp request");

        if !mode.eq_ignore_ascii_case("octet") {
            self.reject(peer, ErrorCode::IllegalOperation, "Only octet mode is supported");
            return Err(TftpError::UnsupportedMode(mode));
        }
        if filename != expected {
            self.reject(peer, ErrorCode::FileNotFound, "File not found");
            return Err(TftpError::UnexpectedFile {
                requested: filename,
                expected: expected.to_owned(),
            });
        }
        Ok((peer, mode))
    }

    fn session(&self, peer: SocketAddr) -> Result<UdpSocket, TftpError> {
        let local = self.socket.local_addr()?;
        let session = UdpSocket::bind(SocketAddr::new(local.ip(), 0))?;
        session.connect(peer)?;
        session.set_read_timeout(Some(self.timeout))?;
        Ok(session)
    }

    fn send_until_acked(
        &self,
        session: &UdpSocket,
        packet: &[u8],
        block: u16,
        file: &str,
    ) -> Result<(), TftpError> {
        let mut buf = [0u8; RECV_BUFFER];
        let mut attempts = 0;
        session.send(packet)?;
        loop {
            let len = match session.recv(&mut buf) {
                Ok(len) => len,
                Err(err) if is_timeout(&err) => {
                    if self.is_cancelled() {
                        return Err(TftpError::Cancelled);
                    }
                    attempts += 1;
                    if attempts > self.retries {
                        return Err(TftpError::Timeout {
                            file: file.to_owned(),
                        });
                    }
                    warn!(file, block, attempts, "tftp ack timed out, resending block");
                    session.send(packet)?;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            match Packet::decode(&buf[..len])? {
                Packet::Ack { block: acked } if acked == block => return Ok(()),
                // stale ack for an earlier block
                Packet::Ack { .. } => {}
                Packet::Error { code, message } => {
                    return Err(TftpError::Remote { code, message })
                }
                other => return Err(TftpError::UnexpectedPacket(other.kind())),
            }
        }
    }

    fn reject(&self, peer: SocketAddr, code: ErrorCode, message: &str) {
        let packet = Packet::error(code, message).encode();
        if let Err(err) = self.socket.send_to(&packet, peer) {
            warn!(%peer, error = %err, "failed to send tftp error");
        }
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
