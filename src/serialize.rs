//! Byte and Base64 encodings of a cuckoo filter
//!
//! ```text
//! offset  size  field
//! 0       4     magic "CKF1"
//! 4       1     hash function id
//! 5       1     entries per bucket
//! 6       1     fingerprint bits
//! 7       1     reserved, zero
//! 8       4     bucket count (u32 LE)
//! 12      4     hash seed (u32 LE)
//! 16      4     occupied slots (u32 LE)
//! 20      n     packed bucket table
//! ```

use crate::config::FilterConfig;
use crate::cuckoo::CuckooFilter;
use crate::hash::HashFunctionId;
use crate::table::BucketTable;
use crate::{CuckooError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Buf, BufMut, Bytes, BytesMut};

const MAGIC: &[u8; 4] = b"CKF1";

/// Encoded header length in bytes
pub const HEADER_LEN: usize = 20;

/// The serialized form of a filter table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedTable {
    bytes: Bytes,
}

impl SerializedTable {
    /// Wrap bytes produced by [`SerializedTable::as_bytes`].
    ///
    /// No validation happens until [`deserialize`] is called.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        SerializedTable {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn from_base64(text: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| CuckooError::CorruptData(format!("invalid base64: {}", e)))?;
        Ok(Self::from_bytes(bytes))
    }
}

/// Encode a filter's configuration and table.
pub fn serialize(filter: &CuckooFilter) -> SerializedTable {
    let config = filter.config();
    let table = filter.table().to_bytes();

    let mut buf = BytesMut::with_capacity(HEADER_LEN + table.len());
    buf.put_slice(MAGIC);
    buf.put_u8(config.hash_function.as_byte());
    buf.put_u8(config.entries_per_bucket);
    buf.put_u8(config.fingerprint_bits);
    buf.put_u8(0);
    // Bounded by MAX_BUCKET_COUNT
    buf.put_u32_le(config.bucket_count as u32);
    buf.put_u32_le(config.hash_seed);
    // Items never outnumber slots, which validate() caps at MAX_SLOT_COUNT
    buf.put_u32_le(filter.len() as u32);
    buf.put_slice(&table);

    SerializedTable {
        bytes: buf.freeze(),
    }
}

/// Rebuild a filter from its serialized form.
pub fn deserialize(serialized: &SerializedTable) -> Result<CuckooFilter> {
    let mut buf = serialized.as_bytes();
    if buf.len() < HEADER_LEN {
        return Err(CuckooError::CorruptData(format!(
            "{} bytes is shorter than the {} byte header",
            buf.len(),
            HEADER_LEN
        )));
    }

    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if &magic != MAGIC {
        return Err(CuckooError::CorruptData("bad magic".to_string()));
    }
    let hash_function = HashFunctionId::try_from(buf.get_u8())?;
    let entries_per_bucket = buf.get_u8();
    let fingerprint_bits = buf.get_u8();
    if buf.get_u8() != 0 {
        return Err(CuckooError::CorruptData(
            "reserved header byte is set".to_string(),
        ));
    }
    let bucket_count = buf.get_u32_le() as usize;
    let hash_seed = buf.get_u32_le();
    let count = buf.get_u32_le() as usize;

    let config = FilterConfig {
        fingerprint_bits,
        bucket_count,
        entries_per_bucket,
        hash_seed,
        hash_function,
    };
    config
        .validate()
        .map_err(|e| CuckooError::CorruptData(format!("bad header: {}", e)))?;

    let table = BucketTable::from_bytes(&config, buf)?;
    let occupied = table.occupied();
    if count != occupied {
        return Err(CuckooError::CorruptData(format!(
            "header records {} items, table holds {}",
            count, occupied
        )));
    }

    Ok(CuckooFilter::from_parts(config, table, count))
}

/// Serialize a filter straight to Base64 text.
pub fn to_base64(filter: &CuckooFilter) -> String {
    serialize(filter).to_base64()
}

/// Decode a filter from Base64 text.
pub fn from_base64(text: &str) -> Result<CuckooFilter> {
    deserialize(&SerializedTable::from_base64(text)?)
}
