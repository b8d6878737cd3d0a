//! ---
//! hiburn_section: "15-testing-qa-runbook"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Console client against a loopback console server."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::io::{BufRead, BufReader, Write};
use std::net::{Ipv4Addr, TcpListener};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use hiburn_core::{response_is_alive, DeviceClient, DeviceError};
use hiburn_uboot::{connect, Console, DEFAULT_PROMPT};

/// Serves one connection the way a HiSilicon U-Boot console would and
/// returns every command it received.
fn spawn_console_server() -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = listener.local_addr().unwrap().to_string();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut received = Vec::new();
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 {
            let command = line.trim_end().to_owned();
            line.clear();
            let reply = match command.as_str() {
                "printenv" => {
                    "bootdelay=1\r\nbaudrate=115200\r\n\r\nEnvironment size: 40/65532 bytes\r\n"
                }
                c if c.starts_with("ping ") => {
                    "Using eth0 device\r\nhost 192.168.1.1 is alive\r\n"
                }
                c if c.starts_with("bootm ") => {
                    write!(writer, "{command}\r\n## Booting kernel ...\r\nStarting kernel ...\r\n")
                        .unwrap();
                    received.push(command.clone());
                    break;
                }
                _ => "",
            };
            write!(writer, "{command}\r\n{reply}{DEFAULT_PROMPT}").unwrap();
            received.push(command);
        }
        received
    });
    (endpoint, handle)
}

#[test]
fn full_session_over_tcp() {
    let (endpoint, server) = spawn_console_server();
    let mut client = connect(&endpoint, DEFAULT_PROMPT, Duration::from_secs(5)).unwrap();

    assert_eq!(client.printenv().unwrap(), ["bootdelay=1", "baudrate=115200"]);
    client
        .setenv(&[("ipaddr", "192.168.1.10"), ("serverip", "192.168.1.1")])
        .unwrap();
    let response = client.ping(Ipv4Addr::new(192, 168, 1, 1)).unwrap();
    assert!(response_is_alive(&response));
    client.bootm(0x8000_0000).unwrap();
    drop(client);

    assert_eq!(
        server.join().unwrap(),
        [
            "",
            "printenv",
            "setenv ipaddr 192.168.1.10",
            "setenv serverip 192.168.1.1",
            "ping 192.168.1.1",
            "bootm 0x80000000",
        ]
    );
}

#[test]
fn silent_console_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = listener.local_addr().unwrap().to_string();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_millis(800));
        drop(stream);
    });

    let err = connect(&endpoint, DEFAULT_PROMPT, Duration::from_millis(200)).unwrap_err();
    assert!(matches!(err, DeviceError::Timeout));
    server.join().unwrap();
}

#[test]
fn device_paths_open_as_files() {
    let temp = tempfile::NamedTempFile::new().unwrap();
    let console = Console::open(temp.path().to_str().unwrap(), Duration::from_secs(1)).unwrap();
    assert!(matches!(console, Console::Device(_)));

    let missing = Console::open("/nonexistent/ttyUSB9", Duration::from_secs(1));
    assert!(missing.is_err());
}

#[cfg(unix)]
#[test]
fn silent_device_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let fifo = dir.path().join("ttyFAKE0");
    let status = Command::new("mkfifo").arg(&fifo).status().unwrap();
    assert!(status.success());

    // the fifo loops our wake-up line back, but no prompt ever follows
    let started = Instant::now();
    let err = connect(fifo.to_str().unwrap(), DEFAULT_PROMPT, Duration::from_millis(200))
        .unwrap_err();
    assert!(matches!(err, DeviceError::Timeout), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_secs(5));
}
