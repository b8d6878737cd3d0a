//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "TFTP packet encoding and decoding."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::TftpError;

/// Payload size of every DATA packet except the last one.
pub const BLOCK_SIZE: usize = 512;

/// Large enough for a full DATA packet or a request carrying options.
pub const RECV_BUFFER: usize = 1024;

const OP_RRQ: u16 = 1;
const OP_WRQ: u16 = 2;
const OP_DATA: u16 = 3;
const OP_ACK: u16 = 4;
const OP_ERROR: u16 = 5;

/// Error codes defined by RFC 1350.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    NotDefined = 0,
    FileNotFound = 1,
    AccessViolation = 2,
    DiskFull = 3,
    IllegalOperation = 4,
    UnknownTransferId = 5,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    ReadRequest { filename: String, mode: String },
    WriteRequest { filename: String, mode: String },
    Data { block: u16, payload: Bytes },
    Ack { block: u16 },
    Error { code: u16, message: String },
}

impl Packet {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code: code as u16,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ReadRequest { .. } => "RRQ",
            Self::WriteRequest { .. } => "WRQ",
            Self::Data { .. } => "DATA",
            Self::Ack { .. } => "ACK",
            Self::Error { .. } => "ERROR",
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + BLOCK_SIZE);
        match self {
            Self::ReadRequest { filename, mode } | Self::WriteRequest { filename, mode } => {
                let opcode = if matches!(self, Self::ReadRequest { .. }) {
                    OP_RRQ
                } else {
                    OP_WRQ
                };
                buf.put_u16(opcode);
                put_cstr(&mut buf, filename);
                put_cstr(&mut buf, mode);
            }
            Self::Data { block, payload } => {
                buf.put_u16(OP_DATA);
                buf.put_u16(*block);
                buf.put_slice(payload);
            }
            Self::Ack { block } => {
                buf.put_u16(OP_ACK);
                buf.put_u16(*block);
            }
            Self::Error { code, message } => {
                buf.put_u16(OP_ERROR);
                buf.put_u16(*code);
                put_cstr(&mut buf, message);
            }
        }
        buf.freeze()
    }

    /// Decode one datagram. Request options (RFC 2347) are ignored.
    pub fn decode(raw: &[u8]) -> Result<Self, TftpError> {
        let mut buf = raw;
        if buf.remaining() < 2 {
            return Err(TftpError::Malformed("truncated opcode"));
        }
        match buf.get_u16() {
            OP_RRQ => {
                let filename = take_cstr(&mut buf)?;
                let mode = take_cstr(&mut buf)?;
                Ok(Self::ReadRequest { filename, mode })
            }
            OP_WRQ => {
                let filename = take_cstr(&mut buf)?;
                let mode = take_cstr(&mut buf)?;
                Ok(Self::WriteRequest { filename, mode })
            }
            OP_DATA => {
                let block = take_block(&mut buf)?;
                if buf.remaining() > BLOCK_SIZE {
                    return Err(TftpError::Malformed("oversized data block"));
                }
                Ok(Self::Data {
                    block,
                    payload: Bytes::copy_from_slice(buf),
                })
            }
            OP_ACK => Ok(Self::Ack {
                block: take_block(&mut buf)?,
            }),
            OP_ERROR => {
                let code = take_block(&mut buf)?;
                // some stacks omit the terminator
                let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
                Ok(Self::Error {
                    code,
                    message: String::from_utf8_lossy(&buf[..end]).into_owned(),
                })
            }
            _ => Err(TftpError::Malformed("unknown opcode")),
        }
    }
}

fn put_cstr(buf: &mut BytesMut, text: &str) {
    buf.put_slice(text.as_bytes());
    buf.put_u8(0);
}

fn take_block(buf: &mut &[u8]) -> Result<u16, TftpError> {
    if buf.remaining() < 2 {
        return Err(TftpError::Malformed("truncated block number"));
    }
    Ok(buf.get_u16())
}

fn take_cstr(buf: &mut &[u8]) -> Result<String, TftpError> {
    let end = buf
        .iter()
        .position(|b| *b == 0)
        .ok_or(TftpError::Malformed("unterminated string"))?;
    let text = String::from_utf8_lossy(&buf[..end]).into_owned();
    buf.advance(end + 1);
    Ok(text)
}
