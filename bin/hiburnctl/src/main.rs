//! ---
//! hiburn_section: "05-networking-external-interfaces"
//! hiburn_subsection: "binary"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Control CLI for provisioning devices through the bootloader console."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use hiburn_common::{LoadedConfig, ProvisionConfig};
use hiburn_core::{Action, CommandRegistry, StdoutSink};
use hiburn_logging as logging;
use hiburn_tftp::TftpTransfer;
use tracing::info;

const SERVICE_NAME: &str = "hiburnctl";

/// Searched in order when neither `--config` nor `HIBURN_CONFIG` is given.
const DEFAULT_CONFIG_PATHS: &[&str] = &["hiburn.toml", "/etc/hiburn/hiburn.toml"];

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Configuration file (defaults to ./hiburn.toml, then /etc/hiburn/hiburn.toml).
    #[arg(
        long,
        short = 'c',
        value_name = "FILE",
        env = "HIBURN_CONFIG",
        global = true
    )]
    config: Option<PathBuf>,

    /// Console endpoint (`host:port` or device path), overriding `console.endpoint`.
    #[arg(long, short = 'd', value_name = "ENDPOINT", global = true)]
    device: Option<String>,
}

fn cli(registry: &CommandRegistry) -> Command {
    let root = Command::new(SERVICE_NAME)
        .about("Provision HiSilicon boards through the U-Boot console")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true);
    registry.augment(GlobalArgs::augment_args(root))
}

fn main() -> Result<()> {
    let registry = CommandRegistry::builtin();
    let matches = cli(&registry).get_matches();
    run(&registry, &matches)
}

fn run(registry: &CommandRegistry, matches: &ArgMatches) -> Result<()> {
    let globals = GlobalArgs::from_arg_matches(matches)?;
    let LoadedConfig { config, source } = load_config(globals.config.as_deref())?;
    logging::init_tracing(
        SERVICE_NAME,
        config.logging.format,
        config.logging.directory.as_deref(),
    )?;
    info!(config = %source.display(), "configuration loaded");

    let (name, args) = matches
        .subcommand()
        .context("no command given; see --help")?;
    let endpoint = globals
        .device
        .or_else(|| config.console.endpoint.clone())
        .context("no console endpoint: pass --device or set console.endpoint")?;

    let mut client =
        hiburn_uboot::connect(&endpoint, &config.console.prompt, config.console.timeout)
            .with_context(|| format!("unable to attach to the console at {endpoint}"))?;
    let transfer = TftpTransfer::new(&config.tftp);
    let mut sink = StdoutSink;
    registry.dispatch(
        name,
        args,
        Action::new(&mut client, &transfer, &config, &mut sink).with_device(&endpoint),
    )?;
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    match explicit {
        Some(path) => {
            let config = ProvisionConfig::from_path(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            Ok(LoadedConfig {
                config,
                source: path.to_path_buf(),
            })
        }
        None => Ok(ProvisionConfig::load(DEFAULT_CONFIG_PATHS)?),
    }
}
