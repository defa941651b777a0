//! Canonical JSON serialization for session types
//!
//! The JSON boundary format carries every integer as a decimal string so that
//! 256-bit values survive tooling that would otherwise route them through a
//! double. Output is always canonical (digits only, no leading zeros beyond a
//! single `"0"`) and input is held to the same rule.

use crate::errors::{SsoError, SsoResult};
use alloy_primitives::U256;
use serde::{de::DeserializeOwned, Serialize};

/// Parse a canonical decimal string into a `U256`.
///
/// Rejects empty strings, signs, whitespace, hex prefixes, exponents and
/// leading zeros (except the literal `"0"`).
pub fn parse_decimal_u256(value: &str) -> SsoResult<U256> {
    validate_decimal(value)?;
    U256::from_str_radix(value, 10)
        .map_err(|e| SsoError::serialization(format!("decimal {value:?} out of range: {e}")))
}

/// Parse a canonical decimal string into a `u64`.
pub fn parse_decimal_u64(value: &str) -> SsoResult<u64> {
    validate_decimal(value)?;
    value
        .parse::<u64>()
        .map_err(|e| SsoError::serialization(format!("decimal {value:?} out of range: {e}")))
}

/// Canonical decimal rendering of a `U256`.
pub fn format_decimal_u256(value: &U256) -> String {
    value.to_string()
}

fn validate_decimal(value: &str) -> SsoResult<()> {
    if value.is_empty() {
        return Err(SsoError::serialization("empty decimal string"));
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SsoError::serialization(format!(
            "decimal {value:?} must contain only ascii digits"
        )));
    }
    if value.len() > 1 && value.starts_with('0') {
        return Err(SsoError::serialization(format!(
            "decimal {value:?} has leading zeros"
        )));
    }
    Ok(())
}

/// Serde adapter: `U256` as a canonical decimal string.
pub mod decimal_u256 {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as decimal string
    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_decimal_u256(value))
    }

    /// Deserialize from a canonical decimal string
    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_decimal_u256(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: `u64` as a canonical decimal string.
pub mod decimal_u64 {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as decimal string
    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    /// Deserialize from a canonical decimal string
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_decimal_u64(&s).map_err(serde::de::Error::custom)
    }
}

/// Discriminant enums (`limitType`, `condition`, `status`) are written as
/// variant names and accepted either by name or by on-chain number.
pub(crate) fn deserialize_wire_enum<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr<Err = SsoError> + TryFrom<u8, Error = SsoError>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Name(String),
        Number(u8),
    }

    match <Repr as serde::Deserialize>::deserialize(deserializer)? {
        Repr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        Repr::Number(n) => T::try_from(n).map_err(serde::de::Error::custom),
    }
}

/// Serialize any session type to compact canonical JSON
pub fn to_json<T: Serialize>(value: &T) -> SsoResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Serialize any session type to pretty-printed canonical JSON
pub fn to_json_pretty<T: Serialize>(value: &T) -> SsoResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Deserialize a session type from canonical JSON
pub fn from_json<T: DeserializeOwned>(json: &str) -> SsoResult<T> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_decimals() {
        assert_eq!(parse_decimal_u256("0").unwrap(), U256::ZERO);
        assert_eq!(
            parse_decimal_u256("100000000000000000").unwrap(),
            U256::from(100_000_000_000_000_000u64)
        );
        assert_eq!(
            parse_decimal_u256(&U256::MAX.to_string()).unwrap(),
            U256::MAX
        );
    }

    #[test]
    fn test_reject_non_canonical_decimals() {
        for bad in ["", "00", "007", "-1", "+1", "1e18", "0x10", " 1", "1.0"] {
            assert!(
                parse_decimal_u256(bad).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_reject_out_of_range() {
        // 2^256
        let too_big =
            "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(parse_decimal_u256(too_big).is_err());
        assert!(parse_decimal_u64("18446744073709551616").is_err());
    }

    #[test]
    fn test_format_has_no_exponent() {
        let value = U256::from(10u64).pow(U256::from(30u64));
        let rendered = format_decimal_u256(&value);
        assert_eq!(rendered, format!("1{}", "0".repeat(30)));
    }

    proptest::proptest! {
        #[test]
        fn test_decimal_text_is_stable(limbs in proptest::array::uniform4(proptest::prelude::any::<u64>())) {
            let value = U256::from_limbs(limbs);
            let text = format_decimal_u256(&value);
            proptest::prop_assert_eq!(parse_decimal_u256(&text).unwrap(), value);
            proptest::prop_assert!(text == "0" || !text.starts_with('0'));
        }
    }
}
