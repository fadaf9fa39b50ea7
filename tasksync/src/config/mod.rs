//! Configuration for the `tasksync` command.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tasksync/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    stores: StoresFileConfig,
    sync: SyncFileConfig,
    display: DisplayFileConfig,
    log: LogFileConfig,
}

/// `[stores]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoresFileConfig {
    local: Option<PathBuf>,
    remote: Option<PathBuf>,
}

/// `[sync]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SyncFileConfig {
    dry_run: Option<bool>,
}

/// `[display]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct DisplayFileConfig {
    top_limit: Option<usize>,
    json: Option<bool>,
}

/// `[log]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct LogFileConfig {
    level: Option<String>,
    file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Snapshot file of the local store.
    pub local_store: Option<PathBuf>,
    /// Snapshot file of the remote store.
    pub remote_store: Option<PathBuf>,
    /// Reconcile without writing anything back.
    pub dry_run: bool,
    /// Number of tasks shown by `list`.
    pub top_limit: usize,
    /// Print machine-readable JSON instead of text.
    pub json_output: bool,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            local_store: None,
            remote_store: None,
            dry_run: false,
            top_limit: 5,
            json_output: false,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit `--config` file cannot be read,
    /// or if any config file present cannot be parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();
        let (cli_dry_run, cli_json, cli_top) = match &cli.command {
            Some(Command::Sync(args)) => (args.dry_run, args.json, None),
            Some(Command::List(args)) => (false, args.json, args.top),
            Some(Command::Add(_)) | None => (false, false, None),
        };

        Self {
            local_store: cli
                .local
                .clone()
                .or_else(|| file.stores.local.clone()),
            remote_store: cli
                .remote
                .clone()
                .or_else(|| file.stores.remote.clone()),
            dry_run: cli_dry_run || file.sync.dry_run.unwrap_or(defaults.dry_run),
            top_limit: cli_top
                .or(file.display.top_limit)
                .unwrap_or(defaults.top_limit),
            json_output: cli_json || file.display.json.unwrap_or(defaults.json_output),
            log_level: cli
                .log_level
                .clone()
                .or_else(|| file.log.level.clone())
                .unwrap_or(defaults.log_level),
            log_file: cli.log_file.clone().or_else(|| file.log.file.clone()),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Two-way task list reconciliation")]
pub struct CliArgs {
    /// Snapshot file of the local store (`.json` or binary).
    #[arg(long, global = true, env = "TASKSYNC_LOCAL")]
    pub local: Option<PathBuf>,

    /// Snapshot file of the remote store (`.json` or binary).
    #[arg(long, global = true, env = "TASKSYNC_REMOTE")]
    pub remote: Option<PathBuf>,

    /// Path to config file (default: `~/.config/tasksync/config.toml`).
    #[arg(short, long, global = true, env = "TASKSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "TASKSYNC_LOG")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// `tasksync` subcommands. Without one, `list` runs.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reconcile the local and remote stores.
    Sync(SyncArgs),
    /// Add a task from free text, e.g. `Buy milk @shopping !2 #tomorrow`.
    Add(AddArgs),
    /// Show the most important tasks of a store.
    List(ListArgs),
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncArgs {
    /// Report what would change without writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct AddArgs {
    /// Task text; markers: `!1`-`!4`/`!high`, `@tag`, `#tomorrow`/`#2025-01-31`.
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Store to add to (default: the local store).
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Store to list (default: the local store).
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Number of tasks to show.
    #[arg(long)]
    pub top: Option<usize>,

    /// Print tasks as JSON.
    #[arg(long)]
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// An explicit path must exist; the default path may be missing.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        p.to_path_buf()
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("tasksync").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit_path.is_none() => {
            Ok(ConfigFile::default())
        }
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
