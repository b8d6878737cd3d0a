//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "U-Boot console client over byte streams."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::borrow::Cow;
use std::io::{self, Read, Write};
use std::net::Ipv4Addr;

use hiburn_core::{DeviceClient, DeviceError};
use hiburn_logging::{hb_debug, hb_error, LogContext};

/// Prompt suffix printed by stock HiSilicon U-Boot builds.
pub const DEFAULT_PROMPT: &str = "hisilicon # ";

/// Printed by `bootm` once control has passed to the kernel.
pub const BOOT_MARKER: &str = "Starting kernel";

const REJECT_MARKERS: &[&str] = &["Unknown command", "Usage:"];

enum Stop {
    Prompt(String),
    Marker(String),
}

/// Blocking U-Boot console client over any byte stream.
#[derive(Debug)]
pub struct UBootClient<T> {
    transport: T,
    prompt: String,
    endpoint: String,
    buffer: Vec<u8>,
}

impl<T: Read + Write> UBootClient<T> {
    pub fn new(transport: T, prompt: impl Into<String>) -> Self {
        Self {
            transport,
            prompt: prompt.into(),
            endpoint: String::new(),
            buffer: Vec::new(),
        }
    }

    /// Name used for the `device` field of log events.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Send an empty line and drain everything up to the next prompt.
    pub fn attach(&mut self) -> Result<(), DeviceError> {
        self.send("")?;
        self.read_until("", &[])?;
        Ok(())
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn send(&mut self, command: &str) -> Result<(), DeviceError> {
        let ctx = LogContext::new().with_device(&self.endpoint);
        hb_debug!(context = ctx, "console <- {command}");
        self.transport.write_all(command.as_bytes())?;
        self.transport.write_all(b"\n")?;
        self.transport.flush()?;
        Ok(())
    }

    /// Read until the echo of `sent` is followed by the prompt or one of
    /// `markers`. Anything queued ahead of the echo is discarded.
    fn read_until(&mut self, sent: &str, markers: &[&str]) -> Result<Stop, DeviceError> {
        let mut chunk = [0u8; 512];
        loop {
            if let Some(stop) = self.scan(sent, markers) {
                self.buffer.clear();
                return Ok(stop);
            }
            let read = match self.transport.read(&mut chunk) {
                Ok(0) => return Err(DeviceError::Closed),
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(DeviceError::Timeout)
                }
                Err(err) => return Err(err.into()),
            };
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    fn scan(&self, sent: &str, markers: &[&str]) -> Option<Stop> {
        let text = String::from_utf8_lossy(&self.buffer);
        let output = &text[echo_start(&text, sent)?..];
        if markers.iter().any(|marker| output.contains(marker)) {
            return Some(Stop::Marker(output.to_owned()));
        }
        output
            .strip_suffix(self.prompt.as_str())
            .map(|output| Stop::Prompt(output.to_owned()))
    }
}

impl<T: Read + Write> DeviceClient for UBootClient<T> {
    fn printenv(&mut self) -> Result<Vec<String>, DeviceError> {
        let lines = self.run("printenv")?;
        Ok(lines
            .into_iter()
            .filter(|line| !line.starts_with("Environment size:"))
            .collect())
    }

    fn setenv(&mut self, vars: &[(&str, &str)]) -> Result<(), DeviceError> {
        for (name, value) in vars {
            self.run(&format!("setenv {name} {}", quote(value)))?;
        }
        Ok(())
    }

    fn ping(&mut self, addr: Ipv4Addr) -> Result<Vec<String>, DeviceError> {
        self.run(&format!("ping {addr}"))
    }

    fn bootm(&mut self, addr: u64) -> Result<(), DeviceError> {
        let command = format!("bootm {addr:#x}");
        self.send(&command)?;
        match self.read_until(&command, &[BOOT_MARKER])? {
            Stop::Marker(_) => Ok(()),
            Stop::Prompt(output) => Err(DeviceError::Rejected {
                output: response_lines(&command, &output).join("\n"),
                command,
            }),
        }
    }

    fn run(&mut self, command: &str) -> Result<Vec<String>, DeviceError> {
        self.send(command)?;
        let output = match self.read_until(command, &[])? {
            Stop::Prompt(output) | Stop::Marker(output) => output,
        };
        let lines = response_lines(command, &output);
        if let Some(line) = lines
            .iter()
            .find(|line| REJECT_MARKERS.iter().any(|marker| line.starts_with(marker)))
        {
            let ctx = LogContext::new().with_device(&self.endpoint);
            hb_error!(context = ctx, "console rejected '{command}': {line}");
            return Err(DeviceError::Rejected {
                command: command.to_owned(),
                output: line.clone(),
            });
        }
        Ok(lines)
    }
}

/// Offset of the echoed `sent` line in `text`; for an empty line, its newline.
fn echo_start(text: &str, sent: &str) -> Option<usize> {
    if sent.is_empty() {
        return text.find(['\r', '\n']);
    }
    text.match_indices(sent)
        .map(|(start, _)| start)
        .find(|start| text[start + sent.len()..].starts_with(['\r', '\n']))
}

/// Lines between the echoed command and the prompt line.
fn response_lines(command: &str, output: &str) -> Vec<String> {
    // the text after the last newline belongs to the prompt
    let body = match output.rfind('\n') {
        Some(end) => &output[..end],
        None => "",
    };
    let mut lines = body
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .skip_while(|line| line.is_empty())
        .peekable();
    if lines.peek().is_some_and(|line| line.trim() == command.trim()) {
        lines.next();
    }
    lines
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Single-quote values the console shell would otherwise split.
fn quote(value: &str) -> Cow<'_, str> {
    if value.is_empty() || value.contains([' ', '\t', ';', '"', '$']) {
        Cow::Owned(format!("'{value}'"))
    } else {
        Cow::Borrowed(value)
    }
}
