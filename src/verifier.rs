//! Statistical correctness checks for serialized filters

use crate::builder::MAX_TARGET_FP_RATE;
use crate::cuckoo::CuckooFilter;
use crate::serialize;
use crate::{CuckooError, Result};
use rand::Rng;
use tracing::debug;

/// Smallest target false-positive rate the verifier accepts, 2^-16
pub const MIN_TARGET_FP_RATE: f64 = 1.0 / 65536.0;

/// How far the measured rate may exceed the target, relative to the target
pub const MAX_RELATIVE_DIFFERENCE: f64 = 0.05;

/// Expected false positives per check; the probe count is this over the target rate.
pub const EXPECTED_FALSE_POSITIVES: f64 = 1000.0;

/// Outcome of a passed false-positive check
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FalsePositiveReport {
    pub samples: usize,
    pub false_positives: usize,
    pub measured_fp_rate: f64,
    pub target_fp_rate: f64,
    pub relative_difference: f64,
}

impl std::fmt::Display for FalsePositiveReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "measured FP rate: {}, target FP rate: {}",
            self.measured_fp_rate, self.target_fp_rate
        )
    }
}

/// Reject target rates outside `[2^-16, 0.5]`.
pub fn validate_target_fp_rate(target_fp_rate: f64) -> Result<()> {
    if target_fp_rate.is_nan() || target_fp_rate > MAX_TARGET_FP_RATE {
        return Err(CuckooError::InvalidArgument(format!(
            "Target false positive rate is too large, must be at most {}, got {}",
            MAX_TARGET_FP_RATE, target_fp_rate
        )));
    }
    if target_fp_rate < MIN_TARGET_FP_RATE {
        return Err(CuckooError::InvalidArgument(format!(
            "Target false positive rate is too small, must be at least 2^(-16), got {}",
            target_fp_rate
        )));
    }
    Ok(())
}

/// Number of random probes used to measure a filter built for `target_fp_rate`
pub fn probe_count(target_fp_rate: f64) -> usize {
    (EXPECTED_FALSE_POSITIVES / target_fp_rate).ceil() as usize
}

/// Every item must test positive.
pub fn check_false_negatives<S: AsRef<str>>(filter: &CuckooFilter, items: &[S]) -> Result<()> {
    for item in items {
        let item: &str = item.as_ref();
        if !filter.contains(item) {
            return Err(CuckooError::FalseNegativeDetected {
                item: item.to_string(),
            });
        }
    }
    Ok(())
}

/// Measure the false-positive rate with `samples` random probes.
///
/// Probes are decimal renderings of random `i64`s. They could in principle
/// equal an inserted item; that chance is ignored.
pub fn measure_false_positives<R: Rng + ?Sized>(
    filter: &CuckooFilter,
    samples: usize,
    target_fp_rate: f64,
    rng: &mut R,
) -> FalsePositiveReport {
    let false_positives = (0..samples)
        .filter(|_| filter.contains(&rng.gen::<i64>().to_string()))
        .count();
    let measured_fp_rate = false_positives as f64 / samples as f64;
    FalsePositiveReport {
        samples,
        false_positives,
        measured_fp_rate,
        target_fp_rate,
        relative_difference: (measured_fp_rate - target_fp_rate) / target_fp_rate,
    }
}

/// Check a serialized filter against the items it was built from.
///
/// Fails with [`CuckooError::FalseNegativeDetected`] if any item is missing,
/// and with [`CuckooError::FalsePositiveRateExceeded`] if the measured
/// false-positive rate is more than 5% above `target_fp_rate`. A measured
/// rate below the target always passes. `target_fp_rate` must pass
/// [`validate_target_fp_rate`].
pub fn check_filter<S: AsRef<str>, R: Rng + ?Sized>(
    items: &[S],
    serialized_filter: &str,
    target_fp_rate: f64,
    rng: &mut R,
) -> Result<FalsePositiveReport> {
    validate_target_fp_rate(target_fp_rate)?;
    let filter = serialize::from_base64(serialized_filter)?;
    check_false_negatives(&filter, items)?;
    debug!(items = items.len(), "False negative check passed");

    let report = measure_false_positives(&filter, probe_count(target_fp_rate), target_fp_rate, rng);
    debug!(
        samples = report.samples,
        false_positives = report.false_positives,
        measured_fp_rate = report.measured_fp_rate,
        "Measured false positive rate"
    );
    if report.relative_difference > MAX_RELATIVE_DIFFERENCE {
        return Err(CuckooError::FalsePositiveRateExceeded {
            measured: report.measured_fp_rate,
            target: target_fp_rate,
            relative_difference: report.relative_difference,
        });
    }
    Ok(report)
}
