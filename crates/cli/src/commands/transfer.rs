//! The transfer flow behind every invocation
//!
//! Validates the job, resolves connection settings, then drives the
//! transfer engine against a real S3 client.

use ud_core::{ConfigManager, Credentials, Result, TransferSummary, Transferer};
use ud_s3::S3Client;

use super::Cli;
use crate::output::{Formatter, TransferReporter};

pub(super) async fn run(cli: &Cli, formatter: &Formatter) -> Result<TransferSummary> {
    // Bad flag values are rejected before anything touches the network
    let job = cli.job()?;

    let manager = ConfigManager::new()?;
    let config = manager.load()?;
    tracing::debug!(path = %manager.config_path().display(), "loaded configuration");

    let credentials = Credentials::resolve(cli.credential_overrides(), &config.defaults)?;
    if credentials.static_keys().is_none()
        && (credentials.access_key.is_some() || credentials.secret_key.is_some())
    {
        formatter.warning(
            "Only one of access key and secret key is set; using the default AWS credential chain",
        );
    }
    tracing::debug!(?credentials, "resolved credentials");

    let client = S3Client::new(&credentials).await?;
    let reporter = TransferReporter::new(formatter.config().clone());
    let transferer = Transferer::new(client, reporter, &credentials.bucket, cli.transfer_config());
    tracing::debug!(bucket = transferer.bucket(), "starting transfer");

    transferer.run(&job).await
}
