//! Transfer policy
//!
//! Part size and concurrency for multipart transfers. The storage adapter
//! applies the policy to each object it moves.

/// One mebibyte
pub const MIB: u64 = 1024 * 1024;

/// Default part size (and single-request threshold): 50 MiB
pub const DEFAULT_PART_SIZE: u64 = 50 * MIB;

/// Default number of parts in flight for one object
pub const DEFAULT_MAX_CONCURRENCY: usize = 50;

/// Minimum part size: 5 MiB (S3 requirement)
pub const MIN_PART_SIZE: u64 = 5 * MIB;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * MIB;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: u64 = 10_000;

/// Part size and concurrency used for every transfer call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Objects larger than this are split into parts of this size
    pub part_size_bytes: u64,

    /// Maximum number of parts transferred concurrently
    pub max_concurrency: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            part_size_bytes: DEFAULT_PART_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl TransferConfig {
    /// Build a policy from the command-line units (MiB, part count)
    pub fn from_cli(threshold_mib: u64, max_concurrency: usize) -> Self {
        Self {
            part_size_bytes: threshold_mib.saturating_mul(MIB).max(1),
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Whether an object of this size goes out in a single request.
    ///
    /// A single PUT is capped at [`MAX_PART_SIZE`] whatever the threshold.
    pub fn is_single_part(&self, object_size: u64) -> bool {
        object_size <= self.part_size_bytes.min(MAX_PART_SIZE)
    }

    /// Part size to use for an object, within S3 limits
    pub fn effective_part_size(&self, object_size: u64) -> u64 {
        let part_size = self.part_size_bytes.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        if object_size.div_ceil(part_size) <= MAX_PARTS {
            part_size
        } else {
            // Need larger parts to fit within the 10,000 limit
            object_size
                .div_ceil(MAX_PARTS)
                .clamp(MIN_PART_SIZE, MAX_PART_SIZE)
        }
    }
}
