//! ---
//! hiburn_section: "01-core-functionality"
//! hiburn_subsection: "module"
//! hiburn_type: "source"
//! hiburn_scope: "code"
//! hiburn_description: "Shared primitives for provisioning configuration."
//! hiburn_version: "v0.0.0-prealpha"
//! hiburn_owner: "tbd"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Parse a human-written size or address.
///
/// Accepts `0x`-prefixed hex, plain decimal, or decimal followed by a binary
/// `K`/`M`/`G` suffix (`"64K"` is 65536).
pub fn parse_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let invalid = |reason| ConfigError::InvalidSize {
        value: input.to_owned(),
        reason,
    };
    if trimmed.is_empty() {
        return Err(invalid("empty value"));
    }

    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).map_err(|_| invalid("not a hexadecimal number"));
    }

    let (digits, multiplier) = match trimmed.chars().last() {
        Some('k' | 'K') => (&trimmed[..trimmed.len() - 1], 1u64 << 10),
        Some('m' | 'M') => (&trimmed[..trimmed.len() - 1], 1u64 << 20),
        Some('g' | 'G') => (&trimmed[..trimmed.len() - 1], 1u64 << 30),
        _ => (trimmed, 1),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| invalid("not a decimal number"))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| invalid("value does not fit in 64 bits"))
}

/// A size as written in configuration, together with its parsed byte count.
///
/// `Display` renders the original text so values such as `256M` reach the
/// kernel command line untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SizeRepr", into = "SizeRepr")]
pub struct SizeLiteral {
    text: String,
    bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Number(u64),
    Text(String),
}

impl SizeLiteral {
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<u64> for SizeLiteral {
    fn from(bytes: u64) -> Self {
        Self {
            text: bytes.to_string(),
            bytes,
        }
    }
}

impl std::str::FromStr for SizeLiteral {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = parse_size(s)?;
        Ok(Self {
            text: s.trim().to_owned(),
            bytes,
        })
    }
}

impl TryFrom<SizeRepr> for SizeLiteral {
    type Error = ConfigError;

    fn try_from(value: SizeRepr) -> Result<Self> {
        match value {
            SizeRepr::Number(bytes) => Ok(Self::from(bytes)),
            SizeRepr::Text(text) => text.parse(),
        }
    }
}

impl From<SizeLiteral> for SizeRepr {
    fn from(value: SizeLiteral) -> Self {
        SizeRepr::Text(value.text)
    }
}

impl fmt::Display for SizeLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
