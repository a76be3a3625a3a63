//! cryptokit: validated bcrypt password hashing and AES-256-CBC
//! encryption services.

pub mod config;
pub mod crypto;
pub mod errors;
pub mod logging;
pub mod providers;

pub use config::Settings;
pub use crypto::{AesService, BcryptService, EncryptedPayload, KeyMaterial};
pub use errors::{CryptoError, DecryptFailure, Result};
pub use providers::CryptoProviders;
