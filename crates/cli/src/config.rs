//! Configuration management for the CLI
//!
//! Tunables come from an optional settings file and `CCR_*` environment
//! variables. Targets come from a CSV file. Credentials come from flags,
//! the environment, or a stdin prompt.

use anyhow::{bail, Context, Result};
use report_lib::{ClientConfig, PollerConfig, TargetInstance};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Conventional header of the address column in the targets file
pub const TARGET_COLUMN: &str = "Prism Central VIP";

/// Tunables for a report run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// URL scheme for Prism endpoints
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Prism port, shared by Central and Element
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Groups API averaging window in seconds
    #[serde(default = "default_downsampling_interval")]
    pub downsampling_interval_secs: u64,

    /// Cluster inventory page length
    #[serde(default = "default_inventory_length")]
    pub inventory_length: u32,

    /// Pause between per-cluster storage queries
    #[serde(default = "default_cluster_delay")]
    pub cluster_delay_ms: u64,

    /// Pause between Prism Central instances
    #[serde(default = "default_instance_delay")]
    pub instance_delay_ms: u64,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_port() -> u16 {
    9440
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_downsampling_interval() -> u64 {
    300
}

fn default_inventory_length() -> u32 {
    500
}

fn default_cluster_delay() -> u64 {
    250
}

fn default_instance_delay() -> u64 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            downsampling_interval_secs: default_downsampling_interval(),
            inventory_length: default_inventory_length(),
            cluster_delay_ms: default_cluster_delay(),
            instance_delay_ms: default_instance_delay(),
        }
    }
}

impl Settings {
    /// Load settings from the given file (or the default locations) and environment
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        match explicit {
            Some(path) => {
                builder = builder.add_source(::config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(user_path) = Self::user_config_path() {
                    builder = builder.add_source(::config::File::from(user_path).required(false));
                }
                builder = builder.add_source(::config::File::with_name("ccr").required(false));
            }
        }

        let settings = builder
            .add_source(::config::Environment::with_prefix("CCR"))
            .build()
            .context("Failed to load settings")?;

        settings
            .try_deserialize()
            .context("Failed to parse settings")
    }

    /// Per-user settings file
    fn user_config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("ccr").join("config.toml"))
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            downsampling_interval_secs: self.downsampling_interval_secs,
            inventory_length: self.inventory_length,
            cluster_delay: Duration::from_millis(self.cluster_delay_ms),
            instance_delay: Duration::from_millis(self.instance_delay_ms),
        }
    }

    pub fn client_config(&self, credentials: Credentials, verify_tls: bool) -> ClientConfig {
        ClientConfig {
            scheme: self.scheme.clone(),
            port: self.port,
            username: credentials.username,
            password: credentials.password,
            request_timeout: Duration::from_secs(self.timeout_secs),
            accept_invalid_certs: !verify_tls,
        }
    }
}

/// Basic auth credentials shared by every endpoint
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Use the given password or prompt for one
    pub fn resolve(username: &str, password: Option<&str>) -> Result<Self> {
        let password = match password {
            Some(p) => p.to_string(),
            None => {
                let stdin = std::io::stdin();
                prompt_password(username, &mut stdin.lock(), &mut std::io::stderr())?
            }
        };

        Ok(Self {
            username: username.to_string(),
            password,
        })
    }
}

/// Prompt on `out` and read one line from `input`
pub fn prompt_password(
    username: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<String> {
    write!(out, "Password for {}: ", username)?;
    out.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password")?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("No password given for {}", username);
    }
    Ok(password)
}

/// Read target addresses from a CSV file with a header row
pub fn load_targets(path: &Path) -> Result<Vec<TargetInstance>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open targets file {}", path.display()))?;
    parse_targets(file).with_context(|| format!("Failed to read targets from {}", path.display()))
}

/// Parse targets from CSV. The `Prism Central VIP` column is used, or the first column.
pub fn parse_targets<R: std::io::Read>(reader: R) -> Result<Vec<TargetInstance>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let column = reader
        .headers()
        .context("Missing header row")?
        .iter()
        .position(|h| h.eq_ignore_ascii_case(TARGET_COLUMN))
        .unwrap_or(0);

    let mut targets = Vec::new();
    for record in reader.records() {
        let record = record.context("Malformed targets row")?;
        match record.get(column) {
            Some(address) if !address.is_empty() => targets.push(TargetInstance::new(address)),
            _ => continue,
        }
    }

    Ok(targets)
}
