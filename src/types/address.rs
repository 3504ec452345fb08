//! Chain account identifiers.

use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Checksum preimage prefix defined by the SS58 address format.
const SS58_PREFIX: &[u8] = b"SS58PRE";

/// A 32-byte Substrate account id.
///
/// Contract addresses arrive in configuration either as `0x…` hex or as
/// an SS58-encoded string; both forms decode to the same 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 32]);

impl AccountId {
    /// Create an account id from raw bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from hex string (with or without 0x prefix)
    ///
    /// # Errors
    /// Returns error if hex is invalid or wrong length
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| AddressError::InvalidHex)?;

        if bytes.len() != 32 {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Decode an SS58-encoded address (single-byte network prefix form).
    ///
    /// Layout: prefix byte, 32-byte public key, 2-byte checksum. The
    /// checksum is the first two bytes of blake2b-512 over
    /// `SS58PRE ++ prefix ++ key`.
    ///
    /// # Errors
    /// Returns error on invalid base58, wrong length, or checksum mismatch
    pub fn from_ss58(s: &str) -> Result<Self, AddressError> {
        let data = bs58::decode(s)
            .into_vec()
            .map_err(|_| AddressError::InvalidBase58)?;

        if data.len() != 35 {
            return Err(AddressError::InvalidLength(data.len()));
        }

        let (body, checksum) = data.split_at(33);
        let mut hasher = Blake2b512::new();
        hasher.update(SS58_PREFIX);
        hasher.update(body);
        let digest = hasher.finalize();
        if digest[..2] != *checksum {
            return Err(AddressError::BadChecksum);
        }

        let mut arr = [0u8; 32];
        arr.copy_from_slice(&body[1..]);
        Ok(Self(arr))
    }

    /// Parse either supported encoding, picking by shape.
    ///
    /// # Errors
    /// Returns error if the string decodes in neither format
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if s.starts_with("0x") || (s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())) {
            Self::from_hex(s)
        } else {
            Self::from_ss58(s)
        }
    }

    /// Convert to hex string with 0x prefix
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_hex())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Address parsing errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AddressError {
    /// Invalid hex encoding
    #[error("invalid hex encoding")]
    InvalidHex,
    /// Invalid base58 encoding
    #[error("invalid base58 encoding")]
    InvalidBase58,
    /// Invalid address length
    #[error("invalid address length: {0} bytes")]
    InvalidLength(usize),
    /// SS58 checksum mismatch
    #[error("SS58 checksum mismatch")]
    BadChecksum,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Alice's well-known dev account.
    const ALICE_SS58: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const ALICE_HEX: &str = "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

    #[test]
    fn test_hex_roundtrip() {
        let addr = AccountId::from_hex(ALICE_HEX).unwrap();
        assert_eq!(addr.to_hex(), ALICE_HEX);
    }

    #[test]
    fn test_ss58_decodes_to_public_key() {
        let from_ss58 = AccountId::from_ss58(ALICE_SS58).unwrap();
        let from_hex = AccountId::from_hex(ALICE_HEX).unwrap();
        assert_eq!(from_ss58, from_hex);
    }

    #[test]
    fn test_parse_picks_format() {
        assert_eq!(
            AccountId::parse(ALICE_SS58).unwrap(),
            AccountId::parse(ALICE_HEX).unwrap()
        );
        // Unprefixed hex of the right length is still hex.
        assert_eq!(
            AccountId::parse(ALICE_HEX.trim_start_matches("0x")).unwrap(),
            AccountId::parse(ALICE_HEX).unwrap()
        );
    }

    #[test]
    fn test_bad_checksum_rejected() {
        // Flip the final character to another base58 digit; decoding
        // succeeds but the checksum no longer matches.
        let mut s: Vec<char> = ALICE_SS58.chars().collect();
        let last = s.len() - 1;
        s[last] = if s[last] == 'Y' { 'Z' } else { 'Y' };
        let tampered: String = s.into_iter().collect();
        assert!(matches!(
            AccountId::from_ss58(&tampered),
            Err(AddressError::BadChecksum | AddressError::InvalidBase58)
        ));
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(matches!(
            AccountId::from_hex("0xdeadbeef"),
            Err(AddressError::InvalidLength(4))
        ));
    }
}
