//! `tasksync`: keep a local and a remote task list in step.
//!
//! ```bash
//! # Reconcile two snapshot files
//! tasksync --local ~/tasks.json --remote /mnt/shared/tasks.bin sync
//!
//! # See what would change
//! tasksync sync --dry-run --json
//!
//! # Quick-add and list
//! tasksync add Buy milk @shopping !2 #tomorrow
//! tasksync list --top 10
//! ```
//!
//! Store paths can also come from `TASKSYNC_LOCAL`/`TASKSYNC_REMOTE` or the
//! `[stores]` section of `~/.config/tasksync/config.toml`.

use std::ffi::OsStr;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tasksync::config::{AddArgs, CliArgs, Command, ListArgs, SyncConfig};
use tasksync::parser::{self, ParseError};
use tasksync::priority;
use tasksync::store::{FileStore, StoreError, TaskStore};
use tasksync::sync::{SyncEngine, SyncError, SyncMode};
use tasksync_proto::task::{Task, Timestamp};
use tracing_appender::non_blocking::WorkerGuard;

/// Errors that end a command with a failure status.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no {0} store configured (use --{0}, TASKSYNC_{1}, or [stores] in the config file)")]
    MissingStore(&'static str, &'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("invalid task: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match SyncConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_logging(&config.log_level, config.log_file.as_deref());

    let command = cli
        .command
        .unwrap_or_else(|| Command::List(ListArgs::default()));

    match run(command, &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging: to `file_path` through a non-blocking writer, or
/// to stderr so stdout stays clean for command output. A path with no file
/// name (such as `..`) falls back to stderr.
///
/// `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some((log_dir, file_name)) = file_path.and_then(log_file_target) else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        if let Some(path) = file_path {
            tracing::warn!(
                path = %path.display(),
                "log file path has no file name, logging to stderr"
            );
        }
        return None;
    };

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Splits a log file path into its directory and file name.
///
/// A bare file name lives in the current directory. Returns `None` when
/// the path does not end in a file name.
fn log_file_target(path: &Path) -> Option<(&Path, &OsStr)> {
    let file_name = path.file_name()?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    Some((dir, file_name))
}

/// Run one subcommand. `Ok(false)` means it completed with failures.
async fn run(command: Command, config: &SyncConfig) -> Result<bool, CliError> {
    match command {
        Command::Sync(_) => run_sync(config).await,
        Command::Add(args) => run_add(args, config).await,
        Command::List(args) => run_list(args, config).await,
    }
}

async fn run_sync(config: &SyncConfig) -> Result<bool, CliError> {
    let local = config
        .local_store
        .clone()
        .ok_or(CliError::MissingStore("local", "LOCAL"))?;
    let remote = config
        .remote_store
        .clone()
        .ok_or(CliError::MissingStore("remote", "REMOTE"))?;

    tracing::info!(local = %local.display(), remote = %remote.display(), "starting sync");
    let engine = SyncEngine::new(FileStore::new(local), FileStore::new(remote));
    let mode = if config.dry_run {
        SyncMode::DryRun
    } else {
        SyncMode::Apply
    };
    let report = engine.run(mode).await?;

    if config.json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
        for failure in &report.failures {
            println!(
                "  failed to {} {} on {}: {}",
                failure.op, failure.task_id, failure.side, failure.reason
            );
        }
    }
    Ok(report.is_clean())
}

async fn run_add(args: AddArgs, config: &SyncConfig) -> Result<bool, CliError> {
    let path = store_path(args.store, config)?;
    let text = args.text.join(" ");
    let task = parser::parse_task(&text, Timestamp::now(), chrono::Utc::now().date_naive())?;

    FileStore::new(path).create(&task).await?;
    tracing::info!(task_id = %task.id, "task added");

    if config.json_output {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("added {}: {}", task.id, describe(&task));
    }
    Ok(true)
}

async fn run_list(args: ListArgs, config: &SyncConfig) -> Result<bool, CliError> {
    let path = store_path(args.store, config)?;
    let mut tasks: Vec<Task> = FileStore::new(path).load_all().await?.into_values().collect();
    tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let now = Timestamp::now();
    let top = priority::top_priority(tasks, now, config.top_limit);

    if config.json_output {
        println!("{}", serde_json::to_string_pretty(&top)?);
    } else if top.is_empty() {
        println!("no tasks");
    } else {
        for task in &top {
            println!(
                "{:>4}  {:<7} {:<11} {}",
                priority::score(task, now),
                task.priority.to_string(),
                task.status.to_string(),
                describe(task)
            );
        }
    }
    Ok(true)
}

fn store_path(explicit: Option<PathBuf>, config: &SyncConfig) -> Result<PathBuf, CliError> {
    explicit
        .or_else(|| config.local_store.clone())
        .ok_or(CliError::MissingStore("local", "LOCAL"))
}

/// Title followed by due date and tags, for text output.
fn describe(task: &Task) -> String {
    let mut line = task.title.clone();
    if let Some(due) = task
        .due_date
        .and_then(|d| i64::try_from(d.as_millis()).ok())
        .and_then(chrono::DateTime::from_timestamp_millis)
    {
        let _ = write!(line, " (due {})", due.format("%Y-%m-%d"));
    }
    for tag in &task.tags {
        line.push_str(" @");
        line.push_str(tag);
    }
    line
}
