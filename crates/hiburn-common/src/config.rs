//! ---
//! hiburn_section: "04-configuration-orchestration"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Provisioning configuration loading and validation."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hiburn_logging::LogFormat;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::net::{parse_device_address, HostInterface};
use crate::size::SizeLiteral;

fn default_prompt() -> String {
    "hisilicon # ".to_owned()
}

fn default_console_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_tftp_port() -> u16 {
    69
}

fn default_tftp_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_tftp_retries() -> u32 {
    5
}

/// Provisioning parameters for one device, loaded once per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    pub net: NetConfig,
    pub mem: MemConfig,
    pub linux_console: String,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub tftp: TftpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where a [`ProvisionConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ProvisionConfig,
    pub source: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetConfig {
    /// Host address reachable from the device, in CIDR form.
    pub host: String,
    /// Device address.
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemConfig {
    pub block_size: SizeLiteral,
    pub base_addr: SizeLiteral,
    pub linux_size: SizeLiteral,
    pub initrd_size: SizeLiteral,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// `host:port` of a console server, or a character device path.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_console_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            prompt: default_prompt(),
            timeout: default_console_timeout(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TftpConfig {
    #[serde(default = "default_tftp_port")]
    pub port: u16,
    #[serde(default = "default_tftp_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    /// Block retransmissions before a transfer is abandoned.
    #[serde(default = "default_tftp_retries")]
    pub retries: u32,
}

impl Default for TftpConfig {
    fn default() -> Self {
        Self {
            port: default_tftp_port(),
            timeout: default_tftp_timeout(),
            retries: default_tftp_retries(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl ProvisionConfig {
    pub const ENV_CONFIG_PATH: &'static str = "HIBURN_CONFIG";
    pub const ENV_PREFIX: &'static str = "HIBURN";

    /// Load configuration from the first existing candidate, respecting the
    /// `HIBURN_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedConfig {
                    config,
                    source: path.to_path_buf(),
                });
            }
        }

        Err(ConfigError::NotFound {
            inspected: candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Read a TOML file and layer `HIBURN__SECTION__KEY` environment overrides on top.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Toml))
            .add_source(
                ::config::Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        let config: ProvisionConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.host_interface()?;
        self.device_ip()?;
        if self.mem.block_size.bytes() == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        Ok(())
    }

    pub fn host_interface(&self) -> Result<HostInterface> {
        HostInterface::parse(&self.net.host)
    }

    pub fn device_ip(&self) -> Result<Ipv4Addr> {
        parse_device_address(&self.net.target)
    }
}

impl std::str::FromStr for ProvisionConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self> {
        let config: ProvisionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
