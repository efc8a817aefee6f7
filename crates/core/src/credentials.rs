//! Storage credentials
//!
//! Credentials are resolved once at startup from command-line flags, the
//! environment (through clap) and the configuration file, in that order.

use crate::config::Defaults;
use crate::error::{Error, Result};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Values given explicitly on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub bucket: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
}

/// Connection details for one bucket on an S3-compatible endpoint
#[derive(Clone)]
pub struct Credentials {
    /// Bucket all transfers read from or write to
    pub bucket: String,

    /// Access key ID (falls back to the SDK credential chain when absent)
    pub access_key: Option<String>,

    /// Secret access key
    pub secret_key: Option<String>,

    /// Endpoint URL for S3-compatible services
    pub endpoint_url: Option<String>,

    /// AWS region
    pub region: String,

    /// Use path-style bucket addressing
    pub path_style: bool,
}

impl Credentials {
    /// Create credentials for a bucket with static keys
    pub fn new(
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            access_key: Some(access_key.into()),
            secret_key: Some(secret_key.into()),
            endpoint_url: None,
            region: DEFAULT_REGION.to_string(),
            path_style: false,
        }
    }

    /// Set a custom endpoint; path-style addressing follows it
    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self.path_style = true;
        self
    }

    /// Merge explicit overrides on top of configured defaults.
    ///
    /// An override always wins over the configuration file. A bucket is
    /// required; everything else is optional.
    pub fn resolve(overrides: CredentialOverrides, defaults: &Defaults) -> Result<Self> {
        // An empty value counts as not given
        let pick = |explicit: Option<String>, configured: &Option<String>| {
            explicit
                .filter(|v| !v.is_empty())
                .or_else(|| configured.clone().filter(|v| !v.is_empty()))
        };

        let bucket = pick(overrides.bucket, &defaults.bucket).ok_or_else(|| {
            Error::InvalidArgument(
                "no bucket name given; use --bucket_name, S3UPDOWN_BUCKET or the config file"
                    .into(),
            )
        })?;

        let endpoint_url = pick(overrides.endpoint_url, &defaults.endpoint_url);
        if let Some(endpoint) = &endpoint_url {
            url::Url::parse(endpoint)?;
        }

        let path_style = defaults.path_style.unwrap_or(endpoint_url.is_some());

        Ok(Self {
            bucket,
            access_key: pick(overrides.access_key, &defaults.access_key),
            secret_key: pick(overrides.secret_key, &defaults.secret_key),
            region: pick(overrides.region, &defaults.region)
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url,
            path_style,
        })
    }

    /// Static key pair, if both halves are configured
    pub fn static_keys(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some((access, secret)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "********"))
            .field("endpoint_url", &self.endpoint_url)
            .field("region", &self.region)
            .field("path_style", &self.path_style)
            .finish()
    }
}
