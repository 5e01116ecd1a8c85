//! # Cuckoo Targeting
//!
//! Compact ad targeting lists backed by cuckoo filters.
//!
//! An ad repository lists the keywords, apps and exclusion terms each ad
//! targets. Shipping those lists verbatim is large and leaks the exact
//! targeting terms, so they are replaced by serialized cuckoo filters which
//! answer "is this term targeted?" with a bounded false-positive rate and no
//! false negatives.
//!
//! The crate is split into the filter itself ([`CuckooFilter`]), its byte
//! encoding ([`serialize`]), a builder that sizes a filter for a target
//! false-positive rate ([`builder`]), a verifier that statistically checks a
//! built filter ([`verifier`]), and the JSON repository glue used by the
//! `make_cuckoo_filter` and `check_cuckoo_filter` binaries.

pub mod builder;
pub mod config;
pub mod cuckoo;
pub mod hash;
pub mod repository;
pub mod serialize;
pub mod table;
pub mod targeting;
pub mod utils;
pub mod verifier;

pub use builder::build_filter;
pub use config::FilterConfig;
pub use cuckoo::{CuckooFilter, FilterStats};
pub use hash::{FilterHash, FnvHash, HashFunctionId, Murmur3Hash};
pub use repository::{Repository, Row, TARGETING_FIELDS};
pub use serialize::SerializedTable;
pub use targeting::AdTargeting;
pub use verifier::{check_filter, FalsePositiveReport};

/// Common error type for the library
#[derive(Debug, thiserror::Error)]
pub enum CuckooError {
    /// Bad argument or out-of-range parameter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// An item could not be placed within the relocation budget.
    #[error("Cuckoo filter capacity exceeded after {kicks} relocations")]
    CapacityExceeded { kicks: usize },
    /// A serialized filter could not be decoded.
    #[error("Corrupt filter data: {0}")]
    CorruptData(String),
    #[error("Cuckoo filter returned false negative for {item:?}")]
    FalseNegativeDetected { item: String },
    #[error(
        "Measured false positives too large: measured {measured}, target {target}, \
         relative difference of {relative_difference}"
    )]
    FalsePositiveRateExceeded {
        measured: f64,
        target: f64,
        relative_difference: f64,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CuckooError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cuckoo_filter() {
        let config = utils::efficient_size(0.01, 1000).unwrap();
        let mut filter = CuckooFilter::new(config).unwrap();

        filter.insert("com.example.app").unwrap();
        filter.insert("shoes").unwrap();
        filter.insert("running").unwrap();

        assert!(filter.contains("com.example.app"));
        assert!(filter.contains("shoes"));
        assert!(filter.contains("running"));
        assert_eq!(filter.len(), 3);
    }

    #[test]
    fn test_base64_round_trip() {
        let encoded = build_filter(&["a", "b", "c"], 0.01, 3).unwrap();
        let filter = serialize::from_base64(&encoded).unwrap();

        assert!(filter.contains("a"));
        assert!(filter.contains("b"));
        assert!(filter.contains("c"));
        assert_eq!(serialize::to_base64(&filter), encoded);
    }

    #[test]
    fn test_error_messages() {
        let err = CuckooError::CapacityExceeded { kicks: 500 };
        assert_eq!(
            err.to_string(),
            "Cuckoo filter capacity exceeded after 500 relocations"
        );

        let err = CuckooError::InvalidArgument("bad rate".to_string());
        assert_eq!(err.to_string(), "Invalid argument: bad rate");
    }
}
