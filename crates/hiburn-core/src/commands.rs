//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Command table mapping CLI names to provisioning actions."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};
use hiburn_common::parse_size;
use hiburn_logging::{log_system_event, SystemEventOutcome};

use crate::action::Action;
use crate::error::{ActionError, DispatchError};

/// Declares a command's arguments on its `clap` subcommand.
pub type ArgsFn = fn(Command) -> Command;

/// Runs a command against a freshly constructed [`Action`].
pub type RunFn = fn(&mut Action<'_>, &ArgMatches) -> Result<(), ActionError>;

/// One entry of the command table.
#[derive(Clone, Copy)]
pub struct CommandDescriptor {
    pub name: &'static str,
    /// One-line help shown in `--help`.
    pub about: &'static str,
    pub args: ArgsFn,
    pub run: RunFn,
}

impl CommandDescriptor {
    /// The `clap` subcommand for this descriptor.
    pub fn command(&self) -> Command {
        (self.args)(Command::new(self.name).about(self.about))
    }
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("about", &self.about)
            .finish()
    }
}

/// Fixed table of commands, looked up by name.
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    commands: Vec<CommandDescriptor>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `printenv`, `ping`, `download`, `upload` and `boot` commands.
    pub fn builtin() -> Self {
        Self {
            commands: BUILTIN_COMMANDS.to_vec(),
        }
    }

    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), DispatchError> {
        if self.get(descriptor.name).is_some() {
            return Err(DispatchError::DuplicateCommand(descriptor.name));
        }
        self.commands.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter()
    }

    /// Attach every registered command to `root` as a subcommand.
    pub fn augment(&self, root: Command) -> Command {
        self.commands
            .iter()
            .fold(root, |root, descriptor| root.subcommand(descriptor.command()))
    }

    /// Run `name` with `action`, which is consumed by the call.
    ///
    /// Failures are returned exactly as the handler produced them.
    pub fn dispatch(
        &self,
        name: &str,
        args: &ArgMatches,
        mut action: Action<'_>,
    ) -> Result<(), DispatchError> {
        let descriptor = self
            .get(name)
            .ok_or_else(|| DispatchError::UnknownCommand(name.to_owned()))?;
        let ctx = action.log_context(descriptor.name);
        match (descriptor.run)(&mut action, args) {
            Ok(()) => {
                log_system_event(
                    Some(&ctx),
                    "action.completed",
                    "command completed",
                    SystemEventOutcome::Success,
                );
                Ok(())
            }
            Err(err) => {
                log_system_event(
                    Some(&ctx),
                    "action.failed",
                    &err.to_string(),
                    SystemEventOutcome::Fault,
                );
                Err(err.into())
            }
        }
    }
}

const BUILTIN_COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "printenv",
        about: "Print U-Boot environment variables",
        args: no_args,
        run: run_printenv,
    },
    CommandDescriptor {
        name: "ping",
        about: "Configure network on device and ping host",
        args: no_args,
        run: run_ping,
    },
    CommandDescriptor {
        name: "download",
        about: "Download data from device's memory via TFTP",
        args: download_args,
        run: run_download,
    },
    CommandDescriptor {
        name: "upload",
        about: "Upload data to device's memory via TFTP",
        args: upload_args,
        run: run_upload,
    },
    CommandDescriptor {
        name: "boot",
        about: "Upload Kernel and RootFS images to device and boot using them",
        args: boot_args,
        run: run_boot,
    },
];

fn no_args(command: Command) -> Command {
    command
}

fn download_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("dst")
                .long("dst")
                .value_name("FILE")
                .default_value("./dump")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Destination file"),
        )
        .arg(
            Arg::new("addr")
                .long("addr")
                .value_name("ADDR")
                .required(true)
                .value_parser(size_arg)
                .help("Address to start downloading from"),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .value_name("SIZE")
                .required(true)
                .value_parser(size_arg)
                .help("Amount of bytes to be downloaded"),
        )
}

fn upload_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("src")
                .long("src")
                .value_name("FILE")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("File to be uploaded"),
        )
        .arg(
            Arg::new("addr")
                .long("addr")
                .value_name("ADDR")
                .required(true)
                .value_parser(size_arg)
                .help("Destination address in device's memory"),
        )
}

fn boot_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("uimage")
                .long("uimage")
                .value_name("FILE")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Kernel UImage file"),
        )
        .arg(
            Arg::new("rootfs")
                .long("rootfs")
                .value_name("FILE")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("RootFS image file"),
        )
}

fn size_arg(raw: &str) -> Result<u64, String> {
    parse_size(raw).map_err(|err| err.to_string())
}

fn required<'m, T>(args: &'m ArgMatches, id: &'static str) -> Result<&'m T, ActionError>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(id)
        .ok_or(ActionError::MissingArgument(id))
}

fn run_printenv(action: &mut Action<'_>, _args: &ArgMatches) -> Result<(), ActionError> {
    action.printenv()
}

fn run_ping(action: &mut Action<'_>, _args: &ArgMatches) -> Result<(), ActionError> {
    action.ping()
}

fn run_download(action: &mut Action<'_>, args: &ArgMatches) -> Result<(), ActionError> {
    let dst = required::<PathBuf>(args, "dst")?;
    let addr = *required::<u64>(args, "addr")?;
    let size = *required::<u64>(args, "size")?;
    action.download(dst, addr, size)
}

fn run_upload(action: &mut Action<'_>, args: &ArgMatches) -> Result<(), ActionError> {
    let src = required::<PathBuf>(args, "src")?;
    let addr = *required::<u64>(args, "addr")?;
    action.upload(src, addr)
}

fn run_boot(action: &mut Action<'_>, args: &ArgMatches) -> Result<(), ActionError> {
    let uimage = required::<PathBuf>(args, "uimage")?;
    let rootfs = required::<PathBuf>(args, "rootfs")?;
    action.boot(uimage, rootfs)
}
