//! Record codecs.

use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Converts records to and from file contents.
///
/// Encoding must not produce an empty buffer: empty files are placeholders
/// reserved by uncommitted creates and read back as "no record".
pub trait RecordCodec<R> {
    /// Encodes the record.
    fn encode(&self, record: &R) -> CoreResult<Vec<u8>>;

    /// Decodes a record from non-empty file contents.
    fn decode(&self, bytes: &[u8]) -> CoreResult<R>;
}

/// Pretty-printed JSON, for any serde record.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<R> RecordCodec<R> for JsonCodec
where
    R: Serialize + DeserializeOwned,
{
    fn encode(&self, record: &R) -> CoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(record).map_err(|e| CoreError::codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> CoreResult<R> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::codec(e.to_string()))
    }
}

/// CBOR, for any serde record.
#[cfg(feature = "cbor")]
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

#[cfg(feature = "cbor")]
impl<R> RecordCodec<R> for CborCodec
where
    R: Serialize + DeserializeOwned,
{
    fn encode(&self, record: &R) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(record, &mut buf)
            .map_err(|e| CoreError::codec(e.to_string()))?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> CoreResult<R> {
        ciborium::de::from_reader(bytes).map_err(|e| CoreError::codec(e.to_string()))
    }
}
