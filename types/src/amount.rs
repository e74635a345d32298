//! Amount encoding.
//!
//! Amounts and balances are raw `u128` units; there are no fractional coins and
//! no floating point anywhere on the value path. On the wire they are decimal
//! strings so that clients whose native number type is a double do not lose
//! precision above 2^53.

/// Serde adapter encoding a `u128` as a decimal string.
///
/// Use with `#[serde(with = "crate::amount::decimal")]`.
pub mod decimal {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.trim()
            .parse::<u128>()
            .map_err(|e| serde::de::Error::custom(format!("invalid amount {s:?}: {e}")))
    }
}
