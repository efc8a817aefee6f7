//! CLI definition and execution
//!
//! s3updown has a single flat command line: every invocation is one
//! upload or download of one file or one folder.

use clap::{ArgAction, Parser};
use ud_core::{CredentialOverrides, Direction, Kind, Result, TransferConfig, TransferJob};
use ud_core::policy::{DEFAULT_MAX_CONCURRENCY, MIB};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod transfer;

/// s3updown - move files and folders between local disk and S3
///
/// Works with AWS S3 and any S3-compatible service reachable through
/// --endpoint_url.
#[derive(Parser, Debug)]
#[command(name = "s3updown")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Transfer direction: 'up' or 'down'
    #[arg(long)]
    pub updown: String,

    /// What to transfer: 'file' or 'folder'
    #[arg(long)]
    pub filefolder: String,

    /// Local path (up) or remote key/prefix (down)
    #[arg(long = "src_path", visible_alias = "src-path")]
    pub src_path: String,

    /// Remote prefix (up) or local directory (down)
    #[arg(long = "dest_path", visible_alias = "dest-path")]
    pub dest_path: String,

    /// Target bucket
    #[arg(long = "bucket_name", visible_alias = "bucket-name", env = "S3UPDOWN_BUCKET")]
    pub bucket_name: Option<String>,

    /// Access key ID
    #[arg(
        long = "access_key",
        visible_alias = "access-key",
        env = "S3UPDOWN_ACCESS_KEY",
        hide_env_values = true
    )]
    pub access_key: Option<String>,

    /// Secret access key
    #[arg(
        long = "secret_key",
        visible_alias = "secret-key",
        env = "S3UPDOWN_SECRET_KEY",
        hide_env_values = true
    )]
    pub secret_key: Option<String>,

    /// Custom endpoint for S3-compatible services
    #[arg(long = "endpoint_url", visible_alias = "endpoint-url", env = "S3UPDOWN_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Region used for request signing
    #[arg(long, env = "S3UPDOWN_REGION")]
    pub region: Option<String>,

    /// Part size in MiB; objects up to this size move in one request
    #[arg(
        long = "multipart_threshold",
        visible_alias = "multipart-threshold",
        default_value_t = 50
    )]
    pub multipart_threshold: u64,

    /// Maximum parts in flight for one object
    #[arg(
        long = "max_concurrency",
        visible_alias = "max-concurrency",
        default_value_t = DEFAULT_MAX_CONCURRENCY
    )]
    pub max_concurrency: usize,

    /// Show a byte-level progress bar per file
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub verbose: bool,

    /// Print the summary as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Cli {
    /// Validate direction and kind into a job
    pub fn job(&self) -> Result<TransferJob> {
        Ok(TransferJob {
            source: self.src_path.clone(),
            destination: self.dest_path.clone(),
            direction: self.updown.parse::<Direction>()?,
            kind: self.filefolder.parse::<Kind>()?,
        })
    }

    /// Connection settings given on the command line or through the environment
    pub fn credential_overrides(&self) -> CredentialOverrides {
        CredentialOverrides {
            bucket: self.bucket_name.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
            endpoint_url: self.endpoint_url.clone(),
            region: self.region.clone(),
        }
    }

    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig::from_cli(self.multipart_threshold, self.max_concurrency)
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            json: self.json,
            no_color: self.no_color,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

/// Execute the transfer and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = cli.output_config();
    let formatter = Formatter::new(output_config.clone());

    tracing::debug!(
        part_size_mib = cli.transfer_config().part_size_bytes / MIB,
        max_concurrency = cli.max_concurrency,
        "starting s3updown"
    );

    let result = tokio::select! {
        result = transfer::run(&cli, &formatter) => result,
        _ = tokio::signal::ctrl_c() => {
            formatter.error("Interrupted");
            return ExitCode::Interrupted;
        }
    };

    match result {
        Ok(summary) => {
            formatter.summary(&summary);
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}
