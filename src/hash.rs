//! Hash functions for cuckoo filters
//!
//! A filter needs one 64-bit hash per item: the low half picks the primary
//! bucket and the high half becomes the fingerprint. The hash function used
//! to build a filter is recorded in its serialized header, so every function
//! here carries a stable [`HashFunctionId`].

use crate::{CuckooError, Result};
use fnv::FnvHasher;
use murmur3::murmur3_x64_128;
use std::hash::Hasher;
use std::io::Cursor;

/// Trait for hash functions used in cuckoo filters
pub trait FilterHash: Send + Sync {
    /// Hash `bytes` under `seed`
    fn hash(&self, bytes: &[u8], seed: u32) -> u64;

    /// Identifier written to serialized tables
    fn id(&self) -> HashFunctionId;
}

/// Serialized identifier of a hash function.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum HashFunctionId {
    #[default]
    Murmur3X64_128 = 0,
    Fnv1a64 = 1,
}

impl HashFunctionId {
    /// The hash function this identifier names.
    pub fn hasher(self) -> &'static dyn FilterHash {
        match self {
            HashFunctionId::Murmur3X64_128 => &Murmur3Hash,
            HashFunctionId::Fnv1a64 => &FnvHash,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for HashFunctionId {
    type Error = CuckooError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(HashFunctionId::Murmur3X64_128),
            1 => Ok(HashFunctionId::Fnv1a64),
            other => Err(CuckooError::CorruptData(format!(
                "unknown hash function id {}",
                other
            ))),
        }
    }
}

/// MurmurHash3 x64 128-bit, truncated to its low 64 bits
#[derive(Debug, Clone, Copy, Default)]
pub struct Murmur3Hash;

impl FilterHash for Murmur3Hash {
    fn hash(&self, bytes: &[u8], seed: u32) -> u64 {
        let digest = murmur3_x64_128(&mut Cursor::new(bytes), seed)
            .expect("reading from an in-memory cursor cannot fail");
        digest as u64
    }

    fn id(&self) -> HashFunctionId {
        HashFunctionId::Murmur3X64_128
    }
}

/// FNV-1a 64-bit keyed with the seed
#[derive(Debug, Clone, Copy, Default)]
pub struct FnvHash;

impl FilterHash for FnvHash {
    fn hash(&self, bytes: &[u8], seed: u32) -> u64 {
        let mut hasher = FnvHasher::with_key(0xcbf2_9ce4_8422_2325 ^ u64::from(seed));
        hasher.write(bytes);
        hasher.finish()
    }

    fn id(&self) -> HashFunctionId {
        HashFunctionId::Fnv1a64
    }
}

/// Mix a fingerprint into a bucket offset for the alternate bucket.
///
/// The constant is the MurmurHash2 multiplier, as in the reference cuckoo
/// filter implementation. The low bit is forced on so an item's two buckets
/// differ whenever the table has more than one.
pub fn fingerprint_offset(fingerprint: u32) -> u64 {
    u64::from(fingerprint).wrapping_mul(0x5bd1_e995) | 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur3_deterministic() {
        let hasher = Murmur3Hash;
        assert_eq!(hasher.hash(b"shoes", 0), hasher.hash(b"shoes", 0));
        assert_ne!(hasher.hash(b"shoes", 0), hasher.hash(b"boots", 0));
        assert_ne!(hasher.hash(b"shoes", 0), hasher.hash(b"shoes", 1));
    }

    #[test]
    fn test_fnv_seeded() {
        let hasher = FnvHash;
        assert_eq!(hasher.hash(b"cat", 7), hasher.hash(b"cat", 7));
        assert_ne!(hasher.hash(b"cat", 7), hasher.hash(b"dog", 7));
        assert_ne!(hasher.hash(b"cat", 7), hasher.hash(b"cat", 8));
    }

    #[test]
    fn test_hash_function_ids() {
        for id in [HashFunctionId::Murmur3X64_128, HashFunctionId::Fnv1a64] {
            assert_eq!(HashFunctionId::try_from(id.as_byte()).unwrap(), id);
            assert_eq!(id.hasher().id(), id);
        }
        assert!(matches!(
            HashFunctionId::try_from(9),
            Err(CuckooError::CorruptData(_))
        ));
    }

    #[test]
    fn test_hash_function_diversity() {
        let key = b"com.example.app";
        let murmur = Murmur3Hash.hash(key, 0);
        let fnv = FnvHash.hash(key, 0);
        assert_ne!(murmur, fnv);
    }
}
