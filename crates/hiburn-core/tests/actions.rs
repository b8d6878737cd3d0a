//! ---
//! hiburn_section: "15-testing-qa-runbook"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Action scenarios against in-memory console and transfer doubles."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
mod common;

use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Command;
use common::{config, FakeClient, FakeTransfer, RecordingSink};
use hiburn_core::{Action, ActionError, CommandRegistry, DispatchError, TransferError};
use tempfile::tempdir;

fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn configure_network_issues_single_write() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let mut client = FakeClient::default();
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    Action::new(&mut client, &transfer, &config, &mut sink)
        .configure_network()
        .unwrap();

    assert_eq!(
        client.setenv_calls,
        vec![pairs(&[
            ("ipaddr", "192.168.1.10"),
            ("netmask", "255.255.255.0"),
            ("serverip", "192.168.1.1"),
        ])]
    );
}

#[test]
fn configure_network_is_idempotent() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    let mut once = FakeClient::default();
    Action::new(&mut once, &transfer, &config, &mut sink)
        .configure_network()
        .unwrap();

    let mut twice = FakeClient::default();
    let mut action = Action::new(&mut twice, &transfer, &config, &mut sink);
    action.configure_network().unwrap();
    action.configure_network().unwrap();
    drop(action);

    assert_eq!(once.env, twice.env);
    assert_eq!(twice.setenv_calls.len(), 2);
}

#[test]
fn ping_succeeds_when_host_is_alive() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let mut client = FakeClient {
        ping_response: vec!["PING 192.168.1.1".into(), "Host 192.168.1.1 is alive".into()],
        ..FakeClient::default()
    };
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    Action::new(&mut client, &transfer, &config, &mut sink)
        .ping()
        .unwrap();

    assert_eq!(client.pinged, vec![Ipv4Addr::new(192, 168, 1, 1)]);
    assert_eq!(
        client.journal,
        ["setenv ipaddr,netmask,serverip", "ping 192.168.1.1"]
    );
}

#[test]
fn ping_fails_when_host_is_unreachable() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let mut client = FakeClient {
        ping_response: vec![
            "PING 192.168.1.1".into(),
            "host 192.168.1.1 is unreachable".into(),
        ],
        ..FakeClient::default()
    };
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    let err = Action::new(&mut client, &transfer, &config, &mut sink)
        .ping()
        .unwrap_err();

    assert!(matches!(err, ActionError::NetworkUnavailable));
    assert_eq!(err.to_string(), "network is unavailable");
}

#[test]
fn printenv_writes_each_line_to_sink() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let mut client = FakeClient {
        printenv_lines: vec!["baudrate=115200".into(), "bootdelay=1".into()],
        ..FakeClient::default()
    };
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    Action::new(&mut client, &transfer, &config, &mut sink)
        .printenv()
        .unwrap();

    assert_eq!(sink.lines, ["baudrate=115200", "bootdelay=1"]);
    assert!(client.setenv_calls.is_empty());
}

#[test]
fn boot_places_rootfs_on_next_block_and_boots_kernel() {
    let temp = tempdir().expect("tempdir");
    let uimage = temp.path().join("uImage");
    let rootfs = temp.path().join("rootfs.squashfs");
    fs::write(&uimage, vec![0u8; 0x12345]).unwrap();
    fs::write(&rootfs, b"rootfs").unwrap();

    let config = config("10.0.0.1/24", "10.0.0.2");
    let mut client = FakeClient::default();
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    Action::new(&mut client, &transfer, &config, &mut sink)
        .boot(&uimage, &rootfs)
        .unwrap();

    let uploads = transfer.uploads.borrow();
    assert_eq!(uploads.len(), 1, "both images go in one batch");
    let (batch, listen_ip) = &uploads[0];
    assert_eq!(*listen_ip, Ipv4Addr::new(10, 0, 0, 1));
    assert_eq!(batch[0].path, uimage);
    assert_eq!(batch[0].addr, 0x8000_0000);
    assert_eq!(batch[1].path, rootfs);
    assert_eq!(batch[1].addr, 0x8002_0000);

    assert_eq!(
        client.env.get("bootargs").map(String::as_str),
        Some(
            "mem=256M console=ttyAMA0,115200 \
             ip=10.0.0.2:10.0.0.1:10.0.0.1:255.255.255.0:camera1::off; \
             mtdparts=hi_sfc:512k(boot) root=/dev/ram0 ro initrd=0x80020000,1048576"
        )
    );
    assert_eq!(client.booted, vec![0x8000_0000]);
    assert_eq!(
        client.journal,
        [
            "setenv ipaddr,netmask,serverip".to_owned(),
            format!("upload {} 0x80000000", uimage.display()),
            format!("upload {} 0x80020000", rootfs.display()),
            "setenv bootargs".to_owned(),
            "bootm 0x80000000".to_owned(),
        ]
    );
    assert_eq!(
        sink.infos.last().map(String::as_str),
        Some("OS seems successfully started")
    );
}

#[test]
fn boot_rejection_is_a_boot_failure_without_success_message() {
    let temp = tempdir().expect("tempdir");
    let uimage = temp.path().join("uImage");
    let rootfs = temp.path().join("rootfs");
    fs::write(&uimage, b"kernel").unwrap();
    fs::write(&rootfs, b"rootfs").unwrap();

    let config = config("10.0.0.1/24", "10.0.0.2");
    let mut client = FakeClient {
        reject_boot: true,
        ..FakeClient::default()
    };
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    let err = Action::new(&mut client, &transfer, &config, &mut sink)
        .boot(&uimage, &rootfs)
        .unwrap_err();

    assert!(matches!(err, ActionError::BootFailure(_)));
    assert!(err.to_string().contains("Wrong Image Format"));
    assert!(!sink
        .infos
        .iter()
        .any(|m| m == "OS seems successfully started"));
}

#[test]
fn failed_upload_stops_before_boot() {
    let temp = tempdir().expect("tempdir");
    let uimage = temp.path().join("uImage");
    let rootfs = temp.path().join("rootfs");
    fs::write(&uimage, b"kernel").unwrap();
    fs::write(&rootfs, b"rootfs").unwrap();

    let config = config("10.0.0.1/24", "10.0.0.2");
    let mut client = FakeClient::default();
    let transfer = FakeTransfer {
        fail_uploads: true,
        ..FakeTransfer::default()
    };
    let mut sink = RecordingSink::default();

    let err = Action::new(&mut client, &transfer, &config, &mut sink)
        .boot(&uimage, &rootfs)
        .unwrap_err();

    assert!(matches!(
        err,
        ActionError::Transfer(TransferError::Timeout { .. })
    ));
    assert!(client.booted.is_empty());
    assert!(!client.env.contains_key("bootargs"));
}

#[test]
fn missing_kernel_image_fails_before_touching_device() {
    let temp = tempdir().expect("tempdir");
    let config = config("10.0.0.1/24", "10.0.0.2");
    let mut client = FakeClient::default();
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    let err = Action::new(&mut client, &transfer, &config, &mut sink)
        .boot(&temp.path().join("missing"), &temp.path().join("rootfs"))
        .unwrap_err();

    assert!(matches!(
        err,
        ActionError::Transfer(TransferError::Source { .. })
    ));
    assert!(client.journal.is_empty());
}

#[test]
fn registry_dispatches_upload_with_parsed_arguments() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let mut client = FakeClient::default();
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    let registry = CommandRegistry::builtin();
    let matches = registry
        .augment(Command::new("hiburnctl"))
        .try_get_matches_from(["hiburnctl", "upload", "--src", "fw.bin", "--addr", "0x81000000"])
        .unwrap();
    let (name, args) = matches.subcommand().unwrap();

    registry
        .dispatch(
            name,
            args,
            Action::new(&mut client, &transfer, &config, &mut sink),
        )
        .unwrap();

    let uploads = transfer.uploads.borrow();
    assert_eq!(uploads[0].0[0].path, PathBuf::from("fw.bin"));
    assert_eq!(uploads[0].0[0].addr, 0x8100_0000);
    assert_eq!(client.journal[0], "setenv ipaddr,netmask,serverip");
}

#[test]
fn registry_dispatches_download_as_single_entry_batch() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let mut client = FakeClient::default();
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    let registry = CommandRegistry::builtin();
    let matches = registry
        .augment(Command::new("hiburnctl"))
        .try_get_matches_from([
            "hiburnctl", "download", "--dst", "out.bin", "--addr", "0x80000000", "--size", "4K",
        ])
        .unwrap();
    let (name, args) = matches.subcommand().unwrap();

    registry
        .dispatch(
            name,
            args,
            Action::new(&mut client, &transfer, &config, &mut sink),
        )
        .unwrap();

    let downloads = transfer.downloads.borrow();
    assert_eq!(downloads.len(), 1);
    let (batch, listen_ip) = &downloads[0];
    assert_eq!(*listen_ip, Ipv4Addr::new(192, 168, 1, 1));
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].path, PathBuf::from("out.bin"));
    assert_eq!(batch[0].addr, 0x8000_0000);
    assert_eq!(batch[0].size, 4096);
}

#[test]
fn registry_propagates_handler_errors_unchanged() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let mut client = FakeClient::default();
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    let registry = CommandRegistry::builtin();
    let matches = registry
        .augment(Command::new("hiburnctl"))
        .try_get_matches_from(["hiburnctl", "ping"])
        .unwrap();
    let (name, args) = matches.subcommand().unwrap();

    let err = registry
        .dispatch(
            name,
            args,
            Action::new(&mut client, &transfer, &config, &mut sink),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Action(ActionError::NetworkUnavailable)
    ));
    assert_eq!(err.to_string(), "network is unavailable");
}

#[test]
fn registry_rejects_unknown_command() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let mut client = FakeClient::default();
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    let err = CommandRegistry::builtin()
        .dispatch(
            "flash",
            &clap::ArgMatches::default(),
            Action::new(&mut client, &transfer, &config, &mut sink),
        )
        .unwrap_err();

    assert!(matches!(err, DispatchError::UnknownCommand(name) if name == "flash"));
}

#[test]
fn log_context_carries_the_console_endpoint() {
    let config = config("192.168.1.1/24", "192.168.1.10");
    let mut client = FakeClient::default();
    let transfer = FakeTransfer::default();
    let mut sink = RecordingSink::default();

    let action = Action::new(&mut client, &transfer, &config, &mut sink);
    assert_eq!(action.log_context("ping").device, None);

    let action = action.with_device("10.0.0.5:2000");
    let ctx = action.log_context("ping");
    assert_eq!(ctx.device, Some("10.0.0.5:2000"));
    assert_eq!(ctx.action, Some("ping"));
}
