use crate::error::{Result, TypesError};
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const ADDRESS_HRP: &str = "bnty";

/// Account identity as supplied by the wallet layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_bech32(&self) -> Result<String> {
        encode_address(&self.0)
    }

    pub fn from_bech32(address: &str) -> Result<Self> {
        decode_address(address).map(Self)
    }

    /// Parses either the bech32 form or a 32-byte hex string.
    pub fn from_string(address: &str) -> Result<Self> {
        if address.starts_with(ADDRESS_HRP) {
            Self::from_bech32(address)
        } else if is_hex_address(address) {
            from_hex_address(address).map(Self)
        } else {
            Err(TypesError::InvalidAddress(format!(
                "unrecognized address format: {}",
                address
            )))
        }
    }
}

impl FromStr for AccountAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(addr) => write!(f, "{}", addr),
            Err(_) => write!(f, "0x{}", hex::encode(&self.0[..8])),
        }
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress(0x{}...)", hex::encode(&self.0[..4]))
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

pub fn encode_address(bytes: &[u8; 32]) -> Result<String> {
    let hrp = Hrp::parse(ADDRESS_HRP).map_err(|e| TypesError::InvalidAddress(e.to_string()))?;

    bech32::encode::<Bech32>(hrp, bytes)
        .map_err(|e| TypesError::InvalidAddress(format!("failed to encode address: {}", e)))
}

pub fn decode_address(address: &str) -> Result<[u8; 32]> {
    let (hrp, data) = bech32::decode(address)
        .map_err(|e| TypesError::InvalidAddress(format!("failed to decode address: {}", e)))?;

    if hrp.as_str() != ADDRESS_HRP {
        return Err(TypesError::InvalidAddress(format!(
            "expected prefix '{}', got '{}'",
            ADDRESS_HRP,
            hrp.as_str()
        )));
    }

    if data.len() != 32 {
        return Err(TypesError::InvalidLength {
            expected: 32,
            actual: data.len(),
        });
    }

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&data);
    Ok(bytes)
}

pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

pub fn is_hex_address(address: &str) -> bool {
    let hex_str = address.strip_prefix("0x").unwrap_or(address);
    hex::decode(hex_str).map(|b| b.len() == 32).unwrap_or(false)
}

pub fn from_hex_address(hex_addr: &str) -> Result<[u8; 32]> {
    let hex_str = hex_addr.strip_prefix("0x").unwrap_or(hex_addr);
    let bytes = hex::decode(hex_str)?;

    if bytes.len() != 32 {
        return Err(TypesError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        });
    }

    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let bytes = [0x12; 32];
        let encoded = encode_address(&bytes).unwrap();

        assert!(encoded.starts_with("bnty1"));
        assert_eq!(decode_address(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_validate_address() {
        let valid = encode_address(&[0x55; 32]).unwrap();

        assert!(validate_address(&valid));
        assert!(!validate_address("invalid_address"));
        assert!(!validate_address("btc1abc123"));
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let hrp = Hrp::parse("adic").unwrap();
        let foreign = bech32::encode::<Bech32>(hrp, &[0x01; 32]).unwrap();
        assert!(matches!(
            decode_address(&foreign),
            Err(TypesError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_from_string_accepts_both_forms() {
        let addr = AccountAddress::from_bytes([0xAB; 32]);

        let from_bech = AccountAddress::from_string(&addr.to_bech32().unwrap()).unwrap();
        let from_hex = AccountAddress::from_string(&format!("0x{}", addr.to_hex())).unwrap();
        let from_bare_hex: AccountAddress = addr.to_hex().parse().unwrap();

        assert_eq!(from_bech, addr);
        assert_eq!(from_hex, addr);
        assert_eq!(from_bare_hex, addr);
        assert!(AccountAddress::from_string("not an address").is_err());
    }
}
