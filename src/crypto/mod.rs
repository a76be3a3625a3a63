//! Cryptographic services for cryptokit.
//!
//! This module provides:
//! - Input validation and key/IV normalization (`validate`)
//! - OS-backed key, IV and secret generation (`random`)
//! - The AES-256-CBC encryption service (`cipher`)
//! - The bcrypt password hashing service (`hashing`)

pub mod cipher;
pub mod hashing;
pub mod random;
pub mod validate;

// Re-export the most commonly used items so callers can write:
//   use cryptokit::crypto::{AesService, BcryptService, KeyMaterial, ...};
pub use cipher::{AesService, EncryptedPayload};
pub use hashing::{BcryptBackend, BcryptService, HashBackend};
pub use random::{generate_aes_iv, generate_aes_key, generate_secret, GeneratedSecret};
pub use validate::{normalize_key_material, KeyMaterial};
