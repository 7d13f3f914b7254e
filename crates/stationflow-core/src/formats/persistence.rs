//! # Snapshot Persistence Format
//!
//! Binary encoding for local progress snapshots.
//!
//! Format: Header (5 bytes) + postcard-serialized `ProgressSnapshot`.
//! - 4 bytes: Magic ("STFL")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded, so a
//! corrupted record fails fast instead of allocating.

use crate::questionnaire::ProgressSnapshot;
use crate::{StationflowError, primitives};

/// Minimum valid record size (header only).
const HEADER_LEN: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The header that precedes every encoded snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), StationflowError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(StationflowError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(StationflowError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StationflowError> {
        let Some(header) = bytes.get(..HEADER_LEN) else {
            return Err(StationflowError::DeserializationError(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Encode a snapshot (header + payload). Pure, no I/O.
pub fn snapshot_to_bytes(snapshot: &ProgressSnapshot) -> Result<Vec<u8>, StationflowError> {
    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| StationflowError::SerializationError(e.to_string()))?;

    if payload.len() > primitives::MAX_SNAPSHOT_SIZE {
        return Err(StationflowError::SerializationError(format!(
            "Snapshot of {} bytes exceeds maximum {} bytes",
            payload.len(),
            primitives::MAX_SNAPSHOT_SIZE
        )));
    }

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Decode a snapshot. Pure, no I/O.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<ProgressSnapshot, StationflowError> {
    if bytes.len() > HEADER_LEN + primitives::MAX_SNAPSHOT_SIZE {
        return Err(StationflowError::DeserializationError(format!(
            "Record of {} bytes exceeds maximum allowed size",
            bytes.len()
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = bytes.get(HEADER_LEN..).unwrap_or_default();
    postcard::from_bytes(payload).map_err(|e| {
        StationflowError::DeserializationError(format!("Failed to decode snapshot: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================
