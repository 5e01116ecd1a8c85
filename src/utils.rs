//! Sizing helpers for cuckoo filters

use crate::config::{FilterConfig, MAX_BUCKET_COUNT, MAX_FINGERPRINT_BITS};
use crate::{CuckooError, Result};
use tracing::debug;

/// Slots per bucket for sized filters
pub const ENTRIES_PER_BUCKET: u8 = 4;

/// Highest occupancy a sized table is planned for.
///
/// Four-slot tables can reach about 95% before inserts start failing, but
/// small tables fail well below that. Sizing for 80% keeps an exactly sized
/// list from running out of relocations.
pub const MAX_LOAD_FACTOR: f64 = 0.8;

/// Fingerprint width needed for `entries_per_bucket` to stay under `target_fp_rate`
///
/// A lookup compares against `2b` slots and each matches a random fingerprint
/// with probability `1 / (2^f - 1)`, so `f` is the smallest width with
/// `2b / (2^f - 1) <= target_fp_rate`.
pub fn fingerprint_bits_for(entries_per_bucket: u8, target_fp_rate: f64) -> u32 {
    let probes = 2.0 * f64::from(entries_per_bucket);
    (probes / target_fp_rate + 1.0).log2().ceil() as u32
}

/// Compute the smallest table reaching `target_fp_rate` for up to
/// `count_upper_bound` items.
///
/// The bucket count is rounded up to a power of two. A bound of zero is
/// sized as one element.
pub fn efficient_size(target_fp_rate: f64, count_upper_bound: usize) -> Result<FilterConfig> {
    if !target_fp_rate.is_finite() || target_fp_rate <= 0.0 || target_fp_rate >= 1.0 {
        return Err(CuckooError::InvalidArgument(format!(
            "Target false positive rate must be in (0, 1), got {}",
            target_fp_rate
        )));
    }

    let fingerprint_bits = fingerprint_bits_for(ENTRIES_PER_BUCKET, target_fp_rate);
    if fingerprint_bits > u32::from(MAX_FINGERPRINT_BITS) {
        return Err(CuckooError::InvalidArgument(format!(
            "Target false positive rate {} needs {} bit fingerprints, at most {} supported",
            target_fp_rate, fingerprint_bits, MAX_FINGERPRINT_BITS
        )));
    }

    let items = count_upper_bound.max(1) as f64;
    let min_buckets = (items / (f64::from(ENTRIES_PER_BUCKET) * MAX_LOAD_FACTOR)).ceil() as usize;
    let bucket_count = min_buckets.max(1).next_power_of_two();
    if bucket_count > MAX_BUCKET_COUNT {
        return Err(CuckooError::InvalidArgument(format!(
            "Count upper bound {} is too large",
            count_upper_bound
        )));
    }

    let config = FilterConfig::new(fingerprint_bits as u8, bucket_count, ENTRIES_PER_BUCKET)?;
    debug!(
        target_fp_rate,
        count_upper_bound, fingerprint_bits, bucket_count, "Sized cuckoo filter"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_bits_for() {
        assert_eq!(fingerprint_bits_for(4, 0.01), 10);
        assert_eq!(fingerprint_bits_for(4, 0.5), 5);
        assert_eq!(fingerprint_bits_for(4, 0.5f64.powi(16)), 20);
        assert_eq!(fingerprint_bits_for(2, 0.5), 4);
    }

    #[test]
    fn test_efficient_size_default_rate() {
        let config = efficient_size(0.01, 1000).unwrap();

        assert_eq!(config.entries_per_bucket, 4);
        assert_eq!(config.fingerprint_bits, 10);
        assert_eq!(config.bucket_count, 512);
        assert!(config.slot_count() as f64 * MAX_LOAD_FACTOR >= 1000.0);
        assert!(config.worst_case_fp_rate() <= 0.01);
    }

    #[test]
    fn test_efficient_size_boundaries() {
        let loose = efficient_size(0.5, 10).unwrap();
        assert!(loose.worst_case_fp_rate() <= 0.5);

        let tight = efficient_size(0.5f64.powi(16), 10).unwrap();
        assert_eq!(tight.fingerprint_bits, 20);
        assert!(tight.worst_case_fp_rate() <= 0.5f64.powi(16));
    }

    #[test]
    fn test_efficient_size_rejects_bad_rates() {
        assert!(efficient_size(0.0, 10).is_err());
        assert!(efficient_size(-0.1, 10).is_err());
        assert!(efficient_size(1.0, 10).is_err());
        assert!(efficient_size(f64::NAN, 10).is_err());
        // Would need more than 32 bit fingerprints
        assert!(efficient_size(1e-12, 10).is_err());
    }

    #[test]
    fn test_efficient_size_small_counts() {
        assert_eq!(efficient_size(0.01, 0).unwrap().bucket_count, 1);
        assert_eq!(efficient_size(0.01, 3).unwrap().bucket_count, 1);
        assert_eq!(efficient_size(0.01, 4).unwrap().bucket_count, 2);
        assert_eq!(efficient_size(0.01, 30).unwrap().bucket_count, 16);
    }

    #[test]
    fn test_exactly_sized_lists_build() {
        for rate in [0.5, 0.25, 0.1, 0.01] {
            for n in 1..=500 {
                let items: Vec<String> = (0..n).map(|i| format!("keyword{}-{}", n, i)).collect();
                let config = efficient_size(rate, n).unwrap();
                assert!(n as f64 <= config.slot_count() as f64 * MAX_LOAD_FACTOR);

                let mut filter = crate::cuckoo::CuckooFilter::new(config).unwrap();
                for item in &items {
                    filter
                        .insert(item)
                        .unwrap_or_else(|e| panic!("rate {} n {}: {}", rate, n, e));
                }
                assert_eq!(filter.len(), n);
            }
        }
    }

    #[test]
    fn test_efficient_size_monotonic() {
        for rate in [0.5, 0.1, 0.01, 0.001, 0.5f64.powi(16)] {
            let mut previous = 0;
            for n in (0..5000).step_by(7) {
                let bits = efficient_size(rate, n).unwrap().table_bits();
                assert!(bits >= previous, "rate {} n {}", rate, n);
                previous = bits;
            }
        }
    }
}
