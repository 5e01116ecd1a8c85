//! Filter configuration

use crate::hash::HashFunctionId;
use crate::{CuckooError, Result};
use serde::{Deserialize, Serialize};

/// Largest supported fingerprint width; fingerprints are drawn from the high
/// 32 bits of the item hash.
pub const MAX_FINGERPRINT_BITS: u8 = 32;

/// Largest supported bucket capacity
pub const MAX_ENTRIES_PER_BUCKET: u8 = 16;

/// Bucket indices are drawn from the low 32 bits of the item hash.
pub const MAX_BUCKET_COUNT: usize = 1 << 31;

/// Serialized headers record the occupied slot count as a `u32`.
pub const MAX_SLOT_COUNT: usize = u32::MAX as usize;

/// Shape of a cuckoo filter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Width of one fingerprint slot in bits
    pub fingerprint_bits: u8,
    /// Number of buckets, always a power of two
    pub bucket_count: usize,
    /// Slots per bucket
    pub entries_per_bucket: u8,
    /// Seed passed to the hash function
    pub hash_seed: u32,
    pub hash_function: HashFunctionId,
}

impl FilterConfig {
    /// Create a configuration using the default hash function and seed.
    pub fn new(fingerprint_bits: u8, bucket_count: usize, entries_per_bucket: u8) -> Result<Self> {
        let config = FilterConfig {
            fingerprint_bits,
            bucket_count,
            entries_per_bucket,
            hash_seed: 0,
            hash_function: HashFunctionId::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_hash_seed(self, hash_seed: u32) -> Self {
        FilterConfig { hash_seed, ..self }
    }

    pub fn with_hash_function(self, hash_function: HashFunctionId) -> Self {
        FilterConfig {
            hash_function,
            ..self
        }
    }

    /// Check the structural invariants of the table shape.
    pub fn validate(&self) -> Result<()> {
        if self.fingerprint_bits == 0 || self.fingerprint_bits > MAX_FINGERPRINT_BITS {
            return Err(CuckooError::InvalidArgument(format!(
                "Fingerprint bits must be 1-{}, got {}",
                MAX_FINGERPRINT_BITS, self.fingerprint_bits
            )));
        }
        if self.entries_per_bucket == 0 || self.entries_per_bucket > MAX_ENTRIES_PER_BUCKET {
            return Err(CuckooError::InvalidArgument(format!(
                "Entries per bucket must be 1-{}, got {}",
                MAX_ENTRIES_PER_BUCKET, self.entries_per_bucket
            )));
        }
        if self.bucket_count == 0
            || !self.bucket_count.is_power_of_two()
            || self.bucket_count > MAX_BUCKET_COUNT
        {
            return Err(CuckooError::InvalidArgument(format!(
                "Bucket count must be a power of two no larger than {}, got {}",
                MAX_BUCKET_COUNT, self.bucket_count
            )));
        }
        let slots = self
            .bucket_count
            .checked_mul(self.entries_per_bucket as usize)
            .filter(|&slots| slots <= MAX_SLOT_COUNT);
        if slots.is_none() {
            return Err(CuckooError::InvalidArgument(format!(
                "{} buckets of {} slots exceed {} slots",
                self.bucket_count, self.entries_per_bucket, MAX_SLOT_COUNT
            )));
        }
        Ok(())
    }

    /// Total number of fingerprint slots
    pub fn slot_count(&self) -> usize {
        self.bucket_count * self.entries_per_bucket as usize
    }

    /// Size of the packed table in bits
    pub fn table_bits(&self) -> usize {
        self.slot_count() * self.fingerprint_bits as usize
    }

    /// Size of the packed table in bytes
    pub fn table_bytes(&self) -> usize {
        (self.table_bits() + 7) / 8
    }

    /// Largest fingerprint value; zero is reserved for empty slots.
    pub fn max_fingerprint(&self) -> u32 {
        if self.fingerprint_bits == 32 {
            u32::MAX
        } else {
            (1u32 << self.fingerprint_bits) - 1
        }
    }

    /// Expected false-positive rate when every slot is occupied.
    pub fn worst_case_fp_rate(&self) -> f64 {
        let probes = 2.0 * f64::from(self.entries_per_bucket);
        (probes / f64::from(self.max_fingerprint())).min(1.0)
    }
}
