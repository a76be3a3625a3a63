use std::fmt;

use thiserror::Error;

/// Boxed underlying cause attached to crypto failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a decryption attempt was rejected.
///
/// Only the structural reason is exposed. Key, IV and plaintext never
/// appear in a decryption error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptFailure {
    /// The ciphertext hex could not be decoded into bytes.
    MalformedCiphertext,
    /// The cipher could not be constructed from the key and IV.
    CipherSetup,
    /// Block length or PKCS#7 padding check failed (wrong key/IV or
    /// corrupted data).
    BadDecrypt,
    /// Decrypted bytes are not valid UTF-8.
    InvalidPlaintext,
}

impl DecryptFailure {
    pub fn code(self) -> &'static str {
        match self {
            DecryptFailure::MalformedCiphertext => "MALFORMED_CIPHERTEXT",
            DecryptFailure::CipherSetup => "CIPHER_SETUP",
            DecryptFailure::BadDecrypt => "BAD_DECRYPT",
            DecryptFailure::InvalidPlaintext => "INVALID_PLAINTEXT",
        }
    }
}

impl fmt::Display for DecryptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// All errors surfaced by the cryptokit services.
#[derive(Debug, Error)]
pub enum CryptoError {
    // --- Caller input errors ---
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid key material: {message}")]
    InvalidKey { message: String },

    // --- Failures inside the underlying primitives ---
    #[error("Encryption failed: {message}")]
    Encryption {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Decryption failed ({cause})")]
    Decryption {
        cause: DecryptFailure,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Hashing failed: {message}")]
    Hashing {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl CryptoError {
    pub fn validation(message: impl Into<String>) -> Self {
        CryptoError::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_key(message: impl Into<String>) -> Self {
        CryptoError::InvalidKey {
            message: message.into(),
        }
    }

    pub fn encryption(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        CryptoError::Encryption {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Decryption failure without an attached cause.
    pub fn decryption(cause: DecryptFailure) -> Self {
        CryptoError::Decryption {
            cause,
            source: None,
        }
    }

    pub fn decryption_from(cause: DecryptFailure, source: impl Into<BoxError>) -> Self {
        CryptoError::Decryption {
            cause,
            source: Some(source.into()),
        }
    }

    pub fn hashing(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        CryptoError::Hashing {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Stable machine-readable code for the error category.
    pub fn code(&self) -> &'static str {
        match self {
            CryptoError::Validation { .. } => "VALIDATION_ERROR",
            CryptoError::InvalidKey { .. } => "INVALID_KEY",
            CryptoError::Encryption { .. } => "ENCRYPTION_ERROR",
            CryptoError::Decryption { .. } => "DECRYPTION_ERROR",
            CryptoError::Hashing { .. } => "HASHING_ERROR",
        }
    }
}

/// Convenience type alias for cryptokit results.
pub type Result<T> = std::result::Result<T, CryptoError>;
