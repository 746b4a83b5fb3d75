use clap::{Parser, Subcommand};
use ferric_scp::scp::constants::DEFAULT_SSH_PORT;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LOG_FILE: &str = "ferric_scp.log";

/// Copy files to and from a remote host over SSH using the scp protocol.
#[derive(Debug, Parser)]
#[command(name = "ferric_scp", version)]
pub struct Cli {
    /// Remote host name or address
    pub host: String,

    #[arg(short = 'P', long, default_value_t = DEFAULT_SSH_PORT)]
    pub port: u16,

    #[arg(short = 'l', long, env = "USER")]
    pub user: String,

    /// Password authentication; the SSH agent is used when absent
    #[arg(long, env = "SCP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Abort the whole transfer after this many seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Copy directories recursively (push only)
    #[arg(short, long)]
    pub recursive: bool,

    /// Preserve access and modification times
    #[arg(short, long)]
    pub preserve: bool,

    /// Print per-file progress to stderr
    #[arg(long)]
    pub progress: bool,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub log_stderr: bool,

    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    #[command(subcommand)]
    pub command: ScpCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScpCommand {
    /// Upload local files or directories
    Push {
        remote_path: String,
        #[arg(required = true)]
        local_paths: Vec<PathBuf>,
    },
    /// Download a remote file
    Pull {
        remote_path: String,
        #[arg(default_value = ".")]
        local_path: PathBuf,
    },
}

impl Cli {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}
