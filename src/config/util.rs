//! Helpers for serde's `skip_serializing_if`, `default` and `deserialize_with`
//! attributes, shared by the configuration schema and the profile model.

use serde::{Deserialize, Deserializer};

// ============================================================================
// Skip Helpers
// ============================================================================

/// Used with `#[serde(skip_serializing_if = "is_false")]` to omit false values.
#[inline]
pub fn is_false(b: &bool) -> bool {
    !*b
}

#[inline]
pub fn is_zero_u16(v: &u16) -> bool {
    *v == 0
}

#[inline]
pub fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

/// Used with `#[serde(default = "default_true")]` on switches that are on
/// unless the profile says otherwise.
#[inline]
pub fn default_true() -> bool {
    true
}

// ============================================================================
// String or Vec Deserializer
// ============================================================================

/// Profiles and sing-box configs both accept either `"x"` or `["x", "y"]`
/// for list-valued fields.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrVec {
    Single(String),
    Multiple(Vec<String>),
}

/// Use with `#[serde(default, deserialize_with = "string_or_vec")]`
pub fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrVec::deserialize(deserializer)? {
        StringOrVec::Single(s) => Ok(vec![s]),
        StringOrVec::Multiple(v) => Ok(v),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum U16OrVec {
    Single(u16),
    Multiple(Vec<u16>),
}

/// Port fields in route rules: `"port": 443` or `"port": [80, 443]`.
pub fn u16_or_vec<'de, D>(deserializer: D) -> Result<Vec<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    match U16OrVec::deserialize(deserializer)? {
        U16OrVec::Single(n) => Ok(vec![n]),
        U16OrVec::Multiple(v) => Ok(v),
    }
}
