//! Input validation and key-material normalization.
//!
//! Every public service operation runs its inputs through these checks
//! before any cryptographic work happens.  Key and IV material may be
//! supplied either as raw bytes or as a hex string; `normalize_key_material`
//! turns both into one canonical byte buffer of an exact length.

use std::sync::OnceLock;

use regex::Regex;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{CryptoError, Result};

/// Lowest bcrypt cost factor accepted.
pub const MIN_SALT_ROUNDS: u32 = 4;

/// Highest bcrypt cost factor accepted.
pub const MAX_SALT_ROUNDS: u32 = 31;

fn bcrypt_hash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$2[aby]\$[0-9]{2}\$[./A-Za-z0-9]{53}$").expect("bcrypt hash pattern is valid")
    })
}

fn bcrypt_salt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$2[aby]\$[0-9]{2}\$[./A-Za-z0-9]{22}$").expect("bcrypt salt pattern is valid")
    })
}

fn hex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]*$").expect("hex pattern is valid"))
}

/// Key or IV material in either of its accepted external forms.
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub enum KeyMaterial {
    Bytes(Vec<u8>),
    Hex(String),
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMaterial::Bytes(b) => write!(f, "KeyMaterial::Bytes(<{} bytes>)", b.len()),
            KeyMaterial::Hex(s) => write!(f, "KeyMaterial::Hex(<{} chars>)", s.len()),
        }
    }
}

impl From<&str> for KeyMaterial {
    fn from(value: &str) -> Self {
        KeyMaterial::Hex(value.to_string())
    }
}

impl From<String> for KeyMaterial {
    fn from(value: String) -> Self {
        KeyMaterial::Hex(value)
    }
}

impl From<Vec<u8>> for KeyMaterial {
    fn from(value: Vec<u8>) -> Self {
        KeyMaterial::Bytes(value)
    }
}

impl From<&[u8]> for KeyMaterial {
    fn from(value: &[u8]) -> Self {
        KeyMaterial::Bytes(value.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for KeyMaterial {
    fn from(value: [u8; N]) -> Self {
        KeyMaterial::Bytes(value.to_vec())
    }
}

/// Fail unless `value` has non-whitespace content.
pub fn assert_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CryptoError::validation(format!(
            "{field} must be a non-empty string"
        )));
    }
    Ok(())
}

/// Fail unless `value` is a finite number greater than zero.
pub fn assert_positive_finite(value: f64, field: &str) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CryptoError::validation(format!(
            "{field} must be a positive finite number (got {value})"
        )));
    }
    Ok(value)
}

/// Fail unless `value` is an integer inside `[min, max]`.
pub fn assert_integer_in_range(value: f64, field: &str, min: u32, max: u32) -> Result<u32> {
    assert_positive_finite(value, field)?;

    if value.fract() != 0.0 {
        return Err(CryptoError::validation(format!(
            "{field} must be an integer (got {value})"
        )));
    }
    if value < f64::from(min) || value > f64::from(max) {
        return Err(CryptoError::validation(format!(
            "{field} must be between {min} and {max} (got {value})"
        )));
    }

    // In range of u32 after the bounds check above.
    Ok(value as u32)
}

/// Fail unless `rounds` is a legal bcrypt cost factor.
pub fn assert_salt_rounds(rounds: u32) -> Result<u32> {
    assert_integer_in_range(
        f64::from(rounds),
        "saltRounds",
        MIN_SALT_ROUNDS,
        MAX_SALT_ROUNDS,
    )
}

/// Normalize key material into bytes, enforcing `expected_len` exactly.
///
/// `None` is passed through so the caller decides whether absence is
/// acceptable.  Lengths are never padded or truncated.
pub fn normalize_key_material(
    value: Option<&KeyMaterial>,
    field: &str,
    expected_len: Option<usize>,
) -> Result<Option<Zeroizing<Vec<u8>>>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let bytes = match value {
        KeyMaterial::Bytes(bytes) => Zeroizing::new(bytes.clone()),
        KeyMaterial::Hex(text) => {
            if !hex_re().is_match(text) || text.len() % 2 != 0 {
                return Err(CryptoError::invalid_key(format!(
                    "{field} must be an even-length hex string"
                )));
            }
            let decoded = hex::decode(text).map_err(|e| {
                CryptoError::invalid_key(format!("{field} is not valid hex: {e}"))
            })?;
            Zeroizing::new(decoded)
        }
    };

    if let Some(expected) = expected_len {
        if bytes.len() != expected {
            return Err(CryptoError::invalid_key(format!(
                "{field} must be {expected} bytes, got {}",
                bytes.len()
            )));
        }
    }

    Ok(Some(bytes))
}

/// Fail unless `value` is a structurally valid bcrypt hash.
pub fn assert_bcrypt_hash(value: &str) -> Result<()> {
    assert_non_empty(value, "hash")?;
    if !bcrypt_hash_re().is_match(value) {
        return Err(CryptoError::validation("hash is not a valid bcrypt hash"));
    }
    Ok(())
}

/// Fail unless `value` is a structurally valid bcrypt salt (`$2b$NN$` + 22 chars).
pub fn assert_bcrypt_salt(value: &str) -> Result<()> {
    assert_non_empty(value, "salt")?;
    if !bcrypt_salt_re().is_match(value) {
        return Err(CryptoError::validation("salt is not a valid bcrypt salt"));
    }
    Ok(())
}

/// Fail unless `value` is non-empty and made only of hex digits.
pub fn assert_hex_ciphertext(value: &str) -> Result<()> {
    assert_non_empty(value, "encryptedData")?;
    if !hex_re().is_match(value) {
        return Err(CryptoError::validation(
            "encryptedData must be a hex string",
        ));
    }
    Ok(())
}

/// Parse the two-digit cost factor out of a bcrypt hash or salt.
///
/// The caller must already have checked the string against the grammar.
pub(crate) fn parse_cost(shaped: &str) -> Result<u32> {
    shaped
        .get(4..6)
        .and_then(|digits| digits.parse::<u32>().ok())
        .ok_or_else(|| CryptoError::validation("cost factor could not be parsed"))
}
