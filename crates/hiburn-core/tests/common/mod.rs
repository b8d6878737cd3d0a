//! ---
//! hiburn_section: "15-testing-qa-runbook"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "In-memory doubles for the console client and transfer collaborators."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use hiburn_common::ProvisionConfig;
use hiburn_core::{
    DeviceClient, DeviceError, DownloadSpec, FileTransfer, OutputSink, TransferError, UploadSpec,
};

pub fn config(host: &str, target: &str) -> ProvisionConfig {
    format!(
        r#"
linux_console = "ttyAMA0,115200"

[net]
host = "{host}"
target = "{target}"

[mem]
block_size = "0x10000"
base_addr = "0x80000000"
linux_size = "256M"
initrd_size = 1048576
"#
    )
    .parse()
    .expect("valid test configuration")
}

/// Records every console interaction in call order.
#[derive(Debug, Default)]
pub struct FakeClient {
    pub env: BTreeMap<String, String>,
    pub setenv_calls: Vec<Vec<(String, String)>>,
    pub printenv_lines: Vec<String>,
    pub ping_response: Vec<String>,
    pub pinged: Vec<Ipv4Addr>,
    pub booted: Vec<u64>,
    pub reject_boot: bool,
    pub journal: Vec<String>,
}

impl DeviceClient for FakeClient {
    fn printenv(&mut self) -> Result<Vec<String>, DeviceError> {
        self.journal.push("printenv".into());
        Ok(self.printenv_lines.clone())
    }

    fn setenv(&mut self, vars: &[(&str, &str)]) -> Result<(), DeviceError> {
        let call: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        for (k, v) in &call {
            self.env.insert(k.clone(), v.clone());
        }
        self.journal.push(format!(
            "setenv {}",
            call.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>().join(",")
        ));
        self.setenv_calls.push(call);
        Ok(())
    }

    fn ping(&mut self, addr: Ipv4Addr) -> Result<Vec<String>, DeviceError> {
        self.journal.push(format!("ping {addr}"));
        self.pinged.push(addr);
        Ok(self.ping_response.clone())
    }

    fn bootm(&mut self, addr: u64) -> Result<(), DeviceError> {
        self.journal.push(format!("bootm {addr:#x}"));
        if self.reject_boot {
            return Err(DeviceError::Rejected {
                command: format!("bootm {addr:#x}"),
                output: "Wrong Image Format for bootm command".into(),
            });
        }
        self.booted.push(addr);
        Ok(())
    }

    fn run(&mut self, command: &str) -> Result<Vec<String>, DeviceError> {
        self.journal.push(command.to_owned());
        Ok(Vec::new())
    }
}

/// Accepts batches and notes them in the client's journal.
#[derive(Debug, Default)]
pub struct FakeTransfer {
    pub uploads: RefCell<Vec<(Vec<UploadSpec>, Ipv4Addr)>>,
    pub downloads: RefCell<Vec<(Vec<DownloadSpec>, Ipv4Addr)>>,
    pub fail_uploads: bool,
}

impl FileTransfer for FakeTransfer {
    fn upload_files(
        &self,
        client: &mut dyn DeviceClient,
        batch: &[UploadSpec],
        listen_ip: Ipv4Addr,
    ) -> Result<(), TransferError> {
        for spec in batch {
            client.run(&format!("upload {} {:#x}", spec.path.display(), spec.addr))?;
        }
        if self.fail_uploads {
            return Err(TransferError::Timeout {
                file: batch[0].path.display().to_string(),
            });
        }
        self.uploads.borrow_mut().push((batch.to_vec(), listen_ip));
        Ok(())
    }

    fn download_files(
        &self,
        client: &mut dyn DeviceClient,
        batch: &[DownloadSpec],
        listen_ip: Ipv4Addr,
    ) -> Result<(), TransferError> {
        for spec in batch {
            client.run(&format!("download {:#x} {:#x}", spec.addr, spec.size))?;
        }
        self.downloads.borrow_mut().push((batch.to_vec(), listen_ip));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub lines: Vec<String>,
    pub infos: Vec<String>,
}

impl OutputSink for RecordingSink {
    fn line(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }

    fn info(&mut self, message: &str) {
        self.infos.push(message.to_owned());
    }
}
