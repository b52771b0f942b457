//! TON smart-contract addresses.
//!
//! An internal address is a signed 8-bit workchain id plus a 256-bit account
//! hash. Two textual forms exist:
//!
//! - raw: `<workchain>:<64 hex chars>`, e.g. `0:e2f5...ee1a`
//! - user-friendly: 36 bytes `tag | workchain | hash | crc16` rendered as
//!   48 base64 (or base64url) characters, e.g. `EQDi9blC...GvIl`
//!
//! The tag byte is 0x11 for bounceable and 0x51 for non-bounceable
//! addresses, with 0x80 OR-ed in for test-only addresses.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::checksum::crc16;
use crate::error::CellError;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;

/// Length of the decoded user-friendly form.
const FRIENDLY_LEN: usize = 36;

/// An `addr_std` internal address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub workchain: i8,
    pub hash: [u8; 32],
}

/// A user-friendly address together with the flags encoded in its tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendlyAddress {
    pub address: Address,
    pub bounceable: bool,
    pub test_only: bool,
}

impl Address {
    pub const fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Parse either the raw or the user-friendly form.
    pub fn parse(s: &str) -> Result<Self, CellError> {
        if s.contains(':') {
            Self::parse_raw(s)
        } else {
            Self::parse_friendly(s).map(|f| f.address)
        }
    }

    /// Parse `<workchain>:<hex hash>`.
    pub fn parse_raw(s: &str) -> Result<Self, CellError> {
        let (wc, hash_hex) = s
            .split_once(':')
            .ok_or_else(|| CellError::InvalidAddress("raw address must contain ':'".into()))?;

        let workchain: i8 = wc
            .parse()
            .map_err(|e| CellError::InvalidAddress(format!("invalid workchain {wc:?}: {e}")))?;

        if hash_hex.len() != 64 {
            return Err(CellError::InvalidAddress(format!(
                "expected 64 hex characters, got {}",
                hash_hex.len()
            )));
        }

        let bytes = hex::decode(hash_hex)
            .map_err(|e| CellError::InvalidAddress(format!("invalid hex: {e}")))?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);

        Ok(Self { workchain, hash })
    }

    /// Parse the 48-character user-friendly form (standard or url-safe base64).
    pub fn parse_friendly(s: &str) -> Result<FriendlyAddress, CellError> {
        if s.len() != 48 {
            return Err(CellError::InvalidAddress(format!(
                "expected 48 characters, got {}",
                s.len()
            )));
        }

        let decoded = if s.contains('-') || s.contains('_') {
            URL_SAFE.decode(s)
        } else {
            STANDARD.decode(s)
        }
        .map_err(|e| CellError::InvalidAddress(format!("base64 decode failed: {e}")))?;

        if decoded.len() != FRIENDLY_LEN {
            return Err(CellError::InvalidAddress(format!(
                "expected {FRIENDLY_LEN} bytes, got {}",
                decoded.len()
            )));
        }

        let expected = crc16(&decoded[..34]);
        let actual = u16::from_be_bytes([decoded[34], decoded[35]]);
        if expected != actual {
            return Err(CellError::InvalidAddress("checksum mismatch".into()));
        }

        let mut tag = decoded[0];
        let test_only = tag & TAG_TEST_ONLY != 0;
        tag &= !TAG_TEST_ONLY;

        let bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            other => {
                return Err(CellError::InvalidAddress(format!(
                    "unknown address tag 0x{other:02x}"
                )))
            }
        };

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&decoded[2..34]);

        Ok(FriendlyAddress {
            address: Address {
                workchain: decoded[1] as i8,
                hash,
            },
            bounceable,
            test_only,
        })
    }

    /// Render as `<workchain>:<hex hash>`.
    pub fn to_raw_string(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    /// Render the user-friendly form.
    pub fn to_friendly(&self, bounceable: bool, test_only: bool, url_safe: bool) -> String {
        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if test_only {
            tag |= TAG_TEST_ONLY;
        }

        let mut bytes = Vec::with_capacity(FRIENDLY_LEN);
        bytes.push(tag);
        bytes.push(self.workchain as u8);
        bytes.extend_from_slice(&self.hash);
        let checksum = crc16(&bytes);
        bytes.extend_from_slice(&checksum.to_be_bytes());

        if url_safe {
            URL_SAFE.encode(&bytes)
        } else {
            STANDARD.encode(&bytes)
        }
    }
}

/// Renders the bounceable, url-safe, mainnet form.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_friendly(true, false, true))
    }
}

impl FromStr for Address {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SY_MINTER: &str = "EQDi9blCcyT-k8iMpFMYY0t7mHVyiCB50ZsRgyUECJDuGvIl";
    const SY_MINTER_RAW: &str =
        "0:e2f5b9427324fe93c88ca45318634b7b987572882079d19b118325040890ee1a";

    #[test]
    fn parse_friendly_known_address() {
        let parsed = Address::parse_friendly(SY_MINTER).unwrap();
        assert!(parsed.bounceable);
        assert!(!parsed.test_only);
        assert_eq!(parsed.address.workchain, 0);
        assert_eq!(parsed.address.to_raw_string(), SY_MINTER_RAW);
    }

    #[test]
    fn display_roundtrips_friendly_form() {
        let addr: Address = SY_MINTER.parse().unwrap();
        assert_eq!(addr.to_string(), SY_MINTER);
    }

    #[test]
    fn raw_and_friendly_forms_agree() {
        let a = Address::parse(SY_MINTER).unwrap();
        let b = Address::parse(SY_MINTER_RAW).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_bounceable_form() {
        let addr = Address::parse(SY_MINTER_RAW).unwrap();
        assert_eq!(
            addr.to_friendly(false, false, true),
            "UQDi9blCcyT-k8iMpFMYY0t7mHVyiCB50ZsRgyUECJDuGq_g"
        );
    }

    #[test]
    fn test_only_flag_is_decoded() {
        let parsed =
            Address::parse_friendly("kQDi9blCcyT-k8iMpFMYY0t7mHVyiCB50ZsRgyUECJDuGkmv").unwrap();
        assert!(parsed.bounceable);
        assert!(parsed.test_only);
    }

    #[test]
    fn standard_base64_form_is_accepted() {
        let addr = Address::parse("EQDi9blCcyT+k8iMpFMYY0t7mHVyiCB50ZsRgyUECJDuGvIl").unwrap();
        assert_eq!(addr.to_raw_string(), SY_MINTER_RAW);
        assert_eq!(
            addr.to_friendly(true, false, false),
            "EQDi9blCcyT+k8iMpFMYY0t7mHVyiCB50ZsRgyUECJDuGvIl"
        );
    }

    #[test]
    fn masterchain_address() {
        let addr = Address::new(-1, [0u8; 32]);
        assert_eq!(addr.to_string(), "Ef8AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAADAU");
        assert_eq!(addr.to_raw_string(), format!("-1:{}", "0".repeat(64)));
        assert_eq!(Address::parse(&addr.to_raw_string()).unwrap(), addr);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let result = Address::parse("EQDi9blCcyT-k8iMpFMYY0t7mHVyiCB50ZsRgyUECJDuGvIm");
        assert!(result.is_err());
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(Address::parse("EQDi9blC").is_err());
        assert!(Address::parse("0:dead").is_err());
    }

    #[test]
    fn bad_workchain_is_rejected() {
        let s = format!("300:{}", "00".repeat(32));
        assert!(Address::parse(&s).is_err());
    }

    #[test]
    fn serde_uses_friendly_string() {
        let addr: Address = SY_MINTER.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{SY_MINTER}\""));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
