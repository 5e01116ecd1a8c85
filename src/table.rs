//! Bucket table storage
//!
//! Fingerprints are packed back to back in a bit vector, `fingerprint_bits`
//! per slot, most significant bit first. Slot `s` of bucket `b` starts at bit
//! `(b * entries_per_bucket + s) * fingerprint_bits`. A stored value of zero
//! marks an empty slot.

use crate::config::FilterConfig;
use crate::{CuckooError, Result};
use bit_vec::BitVec;

/// Value stored in an empty slot
pub const EMPTY_SLOT: u32 = 0;

/// Packed fingerprint table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTable {
    bits: BitVec,
    fingerprint_bits: usize,
    entries_per_bucket: usize,
    bucket_count: usize,
}

impl BucketTable {
    /// Create an all-empty table for `config`
    pub fn new(config: &FilterConfig) -> Self {
        BucketTable {
            bits: BitVec::from_elem(config.table_bits(), false),
            fingerprint_bits: config.fingerprint_bits as usize,
            entries_per_bucket: config.entries_per_bucket as usize,
            bucket_count: config.bucket_count,
        }
    }

    /// Rebuild a table from its packed bytes.
    ///
    /// `bytes` must be exactly [`FilterConfig::table_bytes`] long and any
    /// padding bits past the last slot must be zero.
    pub fn from_bytes(config: &FilterConfig, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != config.table_bytes() {
            return Err(CuckooError::CorruptData(format!(
                "table holds {} bytes, header requires {}",
                bytes.len(),
                config.table_bytes()
            )));
        }
        let mut bits = BitVec::from_bytes(bytes);
        let table_bits = config.table_bits();
        if bits.iter().skip(table_bits).any(|bit| bit) {
            return Err(CuckooError::CorruptData(
                "non-zero padding after the last slot".to_string(),
            ));
        }
        bits.truncate(table_bits);
        Ok(BucketTable {
            bits,
            fingerprint_bits: config.fingerprint_bits as usize,
            entries_per_bucket: config.entries_per_bucket as usize,
            bucket_count: config.bucket_count,
        })
    }

    /// Packed table bytes, zero padded to a whole byte
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.to_bytes()
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn entries_per_bucket(&self) -> usize {
        self.entries_per_bucket
    }

    fn offset(&self, bucket: usize, slot: usize) -> usize {
        debug_assert!(bucket < self.bucket_count);
        debug_assert!(slot < self.entries_per_bucket);
        (bucket * self.entries_per_bucket + slot) * self.fingerprint_bits
    }

    /// Read the fingerprint stored in a slot
    pub fn get(&self, bucket: usize, slot: usize) -> u32 {
        let start = self.offset(bucket, slot);
        (start..start + self.fingerprint_bits).fold(0u32, |acc, i| {
            (acc << 1) | u32::from(self.bits.get(i).unwrap_or(false))
        })
    }

    /// Overwrite a slot, returning the previous value
    pub fn set(&mut self, bucket: usize, slot: usize, fingerprint: u32) -> u32 {
        let previous = self.get(bucket, slot);
        let start = self.offset(bucket, slot);
        for i in 0..self.fingerprint_bits {
            let shift = self.fingerprint_bits - 1 - i;
            self.bits.set(start + i, (fingerprint >> shift) & 1 == 1);
        }
        previous
    }

    /// Place `fingerprint` in the first empty slot of `bucket`
    pub fn try_insert(&mut self, bucket: usize, fingerprint: u32) -> bool {
        for slot in 0..self.entries_per_bucket {
            if self.get(bucket, slot) == EMPTY_SLOT {
                self.set(bucket, slot, fingerprint);
                return true;
            }
        }
        false
    }

    /// Does `bucket` hold `fingerprint` in any slot?
    pub fn bucket_contains(&self, bucket: usize, fingerprint: u32) -> bool {
        (0..self.entries_per_bucket).any(|slot| self.get(bucket, slot) == fingerprint)
    }

    /// Number of non-empty slots
    pub fn occupied(&self) -> usize {
        (0..self.bucket_count)
            .flat_map(|bucket| (0..self.entries_per_bucket).map(move |slot| (bucket, slot)))
            .filter(|&(bucket, slot)| self.get(bucket, slot) != EMPTY_SLOT)
            .count()
    }
}
