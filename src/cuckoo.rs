//! Cuckoo filter implementation
//!
//! Based on _Cuckoo Filter: Practically Better Than Bloom_ (Fan et al.).
//! Every item hashes to a fingerprint and two candidate buckets. The second
//! bucket is derived from the first and the fingerprint alone, which is what
//! lets an evicted fingerprint move to its other bucket without knowing the
//! item it came from.

use crate::config::FilterConfig;
use crate::hash::{fingerprint_offset, FilterHash};
use crate::table::BucketTable;
use crate::{CuckooError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{trace, warn};

/// Relocations attempted before an insert gives up
pub const MAX_KICKS: usize = 500;

/// A cuckoo filter over byte strings
#[derive(Debug, Clone)]
pub struct CuckooFilter {
    config: FilterConfig,
    table: BucketTable,
    /// Successful inserts
    count: usize,
    /// Picks eviction victims
    rng: StdRng,
}

impl CuckooFilter {
    /// Create an empty filter
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        let table = BucketTable::new(&config);
        Ok(Self::from_parts(config, table, 0))
    }

    /// Assemble a filter from an already populated table.
    pub(crate) fn from_parts(config: FilterConfig, table: BucketTable, count: usize) -> Self {
        CuckooFilter {
            rng: StdRng::seed_from_u64(u64::from(config.hash_seed)),
            config,
            table,
            count,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub(crate) fn table(&self) -> &BucketTable {
        &self.table
    }

    fn hasher(&self) -> &'static dyn FilterHash {
        self.config.hash_function.hasher()
    }

    fn mask(&self) -> u64 {
        (self.config.bucket_count - 1) as u64
    }

    /// Primary bucket and fingerprint for an item
    fn locate(&self, item: &[u8]) -> (usize, u32) {
        let hash = self.hasher().hash(item, self.config.hash_seed);
        let bucket = (hash & 0xffff_ffff & self.mask()) as usize;
        let high = hash >> 32;
        // Fingerprints live in [1, max]; zero means empty.
        let fingerprint = (high % u64::from(self.config.max_fingerprint())) as u32 + 1;
        (bucket, fingerprint)
    }

    /// The other candidate bucket for a fingerprint stored in `bucket`.
    ///
    /// Applying this twice returns the original bucket.
    fn alternate_bucket(&self, bucket: usize, fingerprint: u32) -> usize {
        ((bucket as u64 ^ fingerprint_offset(fingerprint)) & self.mask()) as usize
    }

    /// Insert an item.
    ///
    /// Returns [`CuckooError::CapacityExceeded`] when no slot could be freed
    /// within [`MAX_KICKS`] relocations. A failed insert leaves the table as
    /// it was, so earlier items keep testing positive.
    pub fn insert<T: AsRef<[u8]> + ?Sized>(&mut self, item: &T) -> Result<()> {
        let (first, fingerprint) = self.locate(item.as_ref());
        let second = self.alternate_bucket(first, fingerprint);

        if self.table.try_insert(first, fingerprint) || self.table.try_insert(second, fingerprint) {
            self.count += 1;
            return Ok(());
        }

        let mut bucket = if self.rng.gen::<bool>() { first } else { second };
        let mut carried = fingerprint;
        // (bucket, slot, displaced value) for rollback
        let mut path: Vec<(usize, usize, u32)> = Vec::new();

        for kick in 0..MAX_KICKS {
            let slot = self.rng.gen_range(0..self.table.entries_per_bucket());
            let evicted = self.table.set(bucket, slot, carried);
            path.push((bucket, slot, evicted));

            carried = evicted;
            bucket = self.alternate_bucket(bucket, carried);
            if self.table.try_insert(bucket, carried) {
                trace!(kicks = kick + 1, "Relocated fingerprints to make room");
                self.count += 1;
                return Ok(());
            }
        }

        for (bucket, slot, evicted) in path.into_iter().rev() {
            self.table.set(bucket, slot, evicted);
        }
        warn!(
            kicks = MAX_KICKS,
            items = self.count,
            load_factor = self.load_factor(),
            "Cuckoo filter insert failed"
        );
        Err(CuckooError::CapacityExceeded { kicks: MAX_KICKS })
    }

    /// Check if an item might be in the filter
    ///
    /// Returns `false` only when the item was never inserted.
    pub fn contains<T: AsRef<[u8]> + ?Sized>(&self, item: &T) -> bool {
        let (first, fingerprint) = self.locate(item.as_ref());
        if self.table.bucket_contains(first, fingerprint) {
            return true;
        }
        let second = self.alternate_bucket(first, fingerprint);
        self.table.bucket_contains(second, fingerprint)
    }

    /// Number of items inserted
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fraction of slots holding a fingerprint
    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.config.slot_count() as f64
    }

    /// Estimated false-positive rate at the current occupancy
    pub fn expected_fp_rate(&self) -> f64 {
        let per_slot = 1.0 / f64::from(self.config.max_fingerprint());
        let probed = 2.0 * f64::from(self.config.entries_per_bucket) * self.load_factor();
        1.0 - (1.0 - per_slot).powf(probed)
    }

    /// Get statistics about the filter
    pub fn stats(&self) -> FilterStats {
        FilterStats {
            bucket_count: self.config.bucket_count,
            entries_per_bucket: self.config.entries_per_bucket,
            fingerprint_bits: self.config.fingerprint_bits,
            items: self.count,
            load_factor: self.load_factor(),
            expected_fp_rate: self.expected_fp_rate(),
            table_bytes: self.config.table_bytes(),
        }
    }
}

/// Statistics about a cuckoo filter
#[derive(Debug, Clone, serde::Serialize)]
pub struct FilterStats {
    pub bucket_count: usize,
    pub entries_per_bucket: u8,
    pub fingerprint_bits: u8,
    pub items: usize,
    pub load_factor: f64,
    pub expected_fp_rate: f64,
    pub table_bytes: usize,
}

impl std::fmt::Display for FilterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "CuckooFilter Stats:\n\
             - Buckets: {} x {} slots\n\
             - Fingerprint bits: {}\n\
             - Items: {}\n\
             - Load factor: {:.3}\n\
             - Expected FPR: {:.6}\n\
             - Table size: {} bytes",
            self.bucket_count,
            self.entries_per_bucket,
            self.fingerprint_bits,
            self.items,
            self.load_factor,
            self.expected_fp_rate,
            self.table_bytes
        )
    }
}
