//! ud-core: Core library for the s3updown client
//!
//! This crate provides the transfer logic for s3updown, including:
//! - Configuration and credential resolution
//! - Path and key construction
//! - ObjectStore trait for S3 operations
//! - Progress observer interfaces
//! - File and folder transfers
//!
//! This crate is independent of any specific S3 SDK, so transfers can be
//! tested against an in-memory store.

pub mod config;
pub mod credentials;
pub mod error;
pub mod path;
pub mod policy;
pub mod progress;
pub mod store;
pub mod transfer;

pub use config::{Config, ConfigManager, Defaults};
pub use credentials::{CredentialOverrides, Credentials};
pub use error::{Error, Result};
pub use policy::TransferConfig;
pub use progress::{NoProgress, ProgressReporter, ProgressSink, SilentReporter};
pub use store::{ListResult, ObjectInfo, ObjectStore, list_all};
pub use transfer::{
    Direction, FileEntry, Kind, TransferJob, TransferSummary, Transferer,
};
