use crate::error::{Result, TypesError};
use blake3::Hasher;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 32-byte identifier of a bounty or submission.
///
/// In practice this is the content hash under which the payload was stored in the
/// blob store; the ledger never looks inside it. The all-zero value is reserved as the
/// "no id" sentinel and is rejected wherever a real id is required.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentId([u8; 32]);

pub type BountyId = ContentId;
pub type SubmissionId = ContentId;

impl ContentId {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Hash raw payload bytes into an id.
    pub fn from_content(data: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Right-aligned big-endian placement, so `from_u64(4)` renders as `0x00..04`.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Accepts 64 hex characters with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex_str = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != 32 {
            return Err(TypesError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Short form for log fields.
    pub fn short(&self) -> String {
        hex::encode(&self.0[24..])
    }
}

impl From<u64> for ContentId {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl FromStr for ContentId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId(0x...{})", self.short())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
