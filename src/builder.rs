//! Build serialized filters from targeting lists

use crate::cuckoo::CuckooFilter;
use crate::serialize;
use crate::utils::efficient_size;
use crate::{CuckooError, Result};
use tracing::debug;

/// Target false-positive rate used when none is given
pub const DEFAULT_TARGET_FP_RATE: f64 = 0.01;

/// Largest target false-positive rate a filter may be built for
pub const MAX_TARGET_FP_RATE: f64 = 0.5;

/// Build a filter holding `items` and return it as Base64 text.
///
/// The table is sized for `count_upper_bound` items at `target_fp_rate`,
/// which must lie in `(0, 0.5]`. An item that cannot be placed is a fatal
/// [`CuckooError::CapacityExceeded`]; the build is not retried with a larger
/// table.
pub fn build_filter<S: AsRef<[u8]>>(
    items: &[S],
    target_fp_rate: f64,
    count_upper_bound: usize,
) -> Result<String> {
    let filter = build(items, target_fp_rate, count_upper_bound)?;
    Ok(serialize::to_base64(&filter))
}

/// Build a filter holding `items`, see [`build_filter`].
pub fn build<S: AsRef<[u8]>>(
    items: &[S],
    target_fp_rate: f64,
    count_upper_bound: usize,
) -> Result<CuckooFilter> {
    if !(target_fp_rate > 0.0 && target_fp_rate <= MAX_TARGET_FP_RATE) {
        return Err(CuckooError::InvalidArgument(format!(
            "Target false positive rate must be in (0, {}], got {}",
            MAX_TARGET_FP_RATE, target_fp_rate
        )));
    }
    if count_upper_bound < items.len() {
        return Err(CuckooError::InvalidArgument(format!(
            "Count upper bound {} is below the {} items given",
            count_upper_bound,
            items.len()
        )));
    }

    let config = efficient_size(target_fp_rate, count_upper_bound)?;
    let mut filter = CuckooFilter::new(config)?;
    for item in items {
        let bytes: &[u8] = item.as_ref();
        filter.insert(bytes)?;
    }

    debug!(
        items = items.len(),
        load_factor = filter.load_factor(),
        table_bytes = config.table_bytes(),
        "Built cuckoo filter"
    );
    Ok(filter)
}
