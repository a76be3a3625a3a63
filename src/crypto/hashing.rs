//! Bcrypt password hashing service.
//!
//! The bcrypt algorithm itself lives behind the `HashBackend` trait so it
//! can be swapped or mocked; `BcryptBackend` is the production
//! implementation.  `BcryptService` validates every input, hands the
//! CPU-bound work to the backend and reclassifies backend failures as
//! `CryptoError::Hashing`.
//!
//! `hash`, `hash_with_salt` and `compare` are async: validation runs on the
//! caller's task, the bcrypt work runs on tokio's blocking pool.  The
//! `*_sync` variants run everything on the calling thread.
//!
//! # Panics
//!
//! The async variants use `tokio::task::spawn_blocking` and panic when
//! polled outside a Tokio runtime.  Use the `*_sync` variants elsewhere.

use std::sync::Arc;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use zeroize::Zeroizing;

use crate::crypto::random;
use crate::crypto::validate::{
    assert_bcrypt_hash, assert_bcrypt_salt, assert_non_empty, assert_salt_rounds, parse_cost,
};
use crate::errors::{BoxError, CryptoError, Result};
use crate::logging::Diagnostics;

/// Cost factors below this are accepted but logged as weak.
pub const RECOMMENDED_MIN_SALT_ROUNDS: u32 = 12;

/// Raw salt length consumed by bcrypt.
pub const BCRYPT_SALT_LEN: usize = 16;

/// Bcrypt's own base64 flavour: custom alphabet, no padding.
const BCRYPT_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::BCRYPT,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// The password hashing algorithm used by `BcryptService`.
pub trait HashBackend: Send + Sync {
    /// Hash `data` with a fresh random salt at `cost`.
    fn hash(&self, data: &[u8], cost: u32) -> std::result::Result<String, BoxError>;

    /// Hash `data` with a caller-chosen raw salt.
    fn hash_with_salt(
        &self,
        data: &[u8],
        cost: u32,
        salt: [u8; BCRYPT_SALT_LEN],
    ) -> std::result::Result<String, BoxError>;

    /// Check `data` against a structurally valid hash.
    fn verify(&self, data: &[u8], hash: &str) -> std::result::Result<bool, BoxError>;
}

/// `HashBackend` over the `bcrypt` crate, producing `$2b$` hashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct BcryptBackend;

impl HashBackend for BcryptBackend {
    fn hash(&self, data: &[u8], cost: u32) -> std::result::Result<String, BoxError> {
        Ok(::bcrypt::hash(data, cost)?)
    }

    fn hash_with_salt(
        &self,
        data: &[u8],
        cost: u32,
        salt: [u8; BCRYPT_SALT_LEN],
    ) -> std::result::Result<String, BoxError> {
        let parts = ::bcrypt::hash_with_salt(data, cost, salt)?;
        Ok(parts.format_for_version(::bcrypt::Version::TwoB))
    }

    fn verify(&self, data: &[u8], hash: &str) -> std::result::Result<bool, BoxError> {
        Ok(::bcrypt::verify(data, hash)?)
    }
}

/// Bcrypt facade with validation and error classification.
#[derive(Clone)]
pub struct BcryptService {
    backend: Arc<dyn HashBackend>,
    default_salt_rounds: u32,
    diagnostics: Diagnostics,
}

impl std::fmt::Debug for BcryptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BcryptService")
            .field("default_salt_rounds", &self.default_salt_rounds)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl BcryptService {
    /// Service over `BcryptBackend`.
    pub fn new(default_salt_rounds: u32, diagnostics: Diagnostics) -> Result<Self> {
        Self::with_backend(Arc::new(BcryptBackend), default_salt_rounds, diagnostics)
    }

    /// Service over an injected backend.
    pub fn with_backend(
        backend: Arc<dyn HashBackend>,
        default_salt_rounds: u32,
        diagnostics: Diagnostics,
    ) -> Result<Self> {
        let default_salt_rounds = assert_salt_rounds(default_salt_rounds)?;
        Ok(Self {
            backend,
            default_salt_rounds,
            diagnostics,
        })
    }

    pub fn default_salt_rounds(&self) -> u32 {
        self.default_salt_rounds
    }

    /// Resolve and validate the cost for a call, warning on weak values.
    fn resolve_rounds(&self, salt_rounds: Option<u32>) -> Result<u32> {
        let rounds = assert_salt_rounds(salt_rounds.unwrap_or(self.default_salt_rounds))?;
        if rounds < RECOMMENDED_MIN_SALT_ROUNDS {
            self.diagnostics.warn(
                &[
                    ("saltRounds", rounds.to_string()),
                    ("recommended", RECOMMENDED_MIN_SALT_ROUNDS.to_string()),
                ],
                "bcrypt cost factor below recommended minimum",
            );
        }
        Ok(rounds)
    }

    fn hashed(&self, hash: String) -> String {
        self.diagnostics
            .debug_secret("hash", &hash, "bcrypt hash generated");
        hash
    }

    /// Hash `data`.  `None` uses the configured default cost.
    pub async fn hash(&self, data: &str, salt_rounds: Option<u32>) -> Result<String> {
        assert_non_empty(data, "data")?;
        let rounds = self.resolve_rounds(salt_rounds)?;

        let backend = Arc::clone(&self.backend);
        let data = Zeroizing::new(data.as_bytes().to_vec());
        let hash = tokio::task::spawn_blocking(move || backend.hash(&data, rounds))
            .await
            .map_err(|e| CryptoError::hashing("bcrypt hash task failed", e))?
            .map_err(|e| CryptoError::hashing("bcrypt hash failed", e))?;

        Ok(self.hashed(hash))
    }

    pub fn hash_sync(&self, data: &str, salt_rounds: Option<u32>) -> Result<String> {
        assert_non_empty(data, "data")?;
        let rounds = self.resolve_rounds(salt_rounds)?;

        let hash = self
            .backend
            .hash(data.as_bytes(), rounds)
            .map_err(|e| CryptoError::hashing("bcrypt hash failed", e))?;

        Ok(self.hashed(hash))
    }

    /// Hash `data` with a salt produced by `gen_salt`.
    pub async fn hash_with_salt(&self, data: &str, salt: &str) -> Result<String> {
        assert_non_empty(data, "data")?;
        let (rounds, raw_salt) = self.decode_salt(salt)?;

        let backend = Arc::clone(&self.backend);
        let data = Zeroizing::new(data.as_bytes().to_vec());
        let hash =
            tokio::task::spawn_blocking(move || backend.hash_with_salt(&data, rounds, raw_salt))
                .await
                .map_err(|e| CryptoError::hashing("bcrypt hash task failed", e))?
                .map_err(|e| CryptoError::hashing("bcrypt hash failed", e))?;

        Ok(self.hashed(hash))
    }

    pub fn hash_with_salt_sync(&self, data: &str, salt: &str) -> Result<String> {
        assert_non_empty(data, "data")?;
        let (rounds, raw_salt) = self.decode_salt(salt)?;

        let hash = self
            .backend
            .hash_with_salt(data.as_bytes(), rounds, raw_salt)
            .map_err(|e| CryptoError::hashing("bcrypt hash failed", e))?;

        Ok(self.hashed(hash))
    }

    /// `Ok(false)` on mismatch; a malformed hash is a validation error.
    pub async fn compare(&self, data: &str, hash: &str) -> Result<bool> {
        assert_non_empty(data, "data")?;
        assert_bcrypt_hash(hash)?;

        let backend = Arc::clone(&self.backend);
        let data = Zeroizing::new(data.as_bytes().to_vec());
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || backend.verify(&data, &hash))
            .await
            .map_err(|e| CryptoError::hashing("bcrypt compare task failed", e))?
            .map_err(|e| CryptoError::hashing("bcrypt compare failed", e))
    }

    pub fn compare_sync(&self, data: &str, hash: &str) -> Result<bool> {
        assert_non_empty(data, "data")?;
        assert_bcrypt_hash(hash)?;

        self.backend
            .verify(data.as_bytes(), hash)
            .map_err(|e| CryptoError::hashing("bcrypt compare failed", e))
    }

    /// Generate a `$2b$NN$` salt string.  `None` uses the configured
    /// default cost.
    pub fn gen_salt(&self, salt_rounds: Option<u32>) -> Result<String> {
        let rounds = self.resolve_rounds(salt_rounds)?;
        let raw = random::generate_secret(BCRYPT_SALT_LEN)
            .map_err(|e| CryptoError::hashing("salt generation failed", e))?;
        Ok(format!(
            "$2b${rounds:02}${}",
            BCRYPT_B64.encode(raw.as_bytes())
        ))
    }

    /// Cost factor recorded in `hash`.
    pub fn get_salt_rounds(&self, hash: &str) -> Result<u32> {
        assert_bcrypt_hash(hash)?;
        parse_cost(hash)
    }

    fn decode_salt(&self, salt: &str) -> Result<(u32, [u8; BCRYPT_SALT_LEN])> {
        assert_bcrypt_salt(salt)?;
        let rounds = self.resolve_rounds(Some(parse_cost(salt)?))?;

        let decoded = BCRYPT_B64
            .decode(&salt[7..])
            .map_err(|e| CryptoError::validation(format!("salt is not valid bcrypt base64: {e}")))?;
        let raw: [u8; BCRYPT_SALT_LEN] = decoded.as_slice().try_into().map_err(|_| {
            CryptoError::validation(format!(
                "salt must decode to {BCRYPT_SALT_LEN} bytes, got {}",
                decoded.len()
            ))
        })?;
        Ok((rounds, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::testing::RecordingLogger;
    use tracing::Level;

    /// Backend whose every call fails.
    struct BrokenBackend;

    impl HashBackend for BrokenBackend {
        fn hash(&self, _: &[u8], _: u32) -> std::result::Result<String, BoxError> {
            Err("backend offline".into())
        }

        fn hash_with_salt(
            &self,
            _: &[u8],
            _: u32,
            _: [u8; BCRYPT_SALT_LEN],
        ) -> std::result::Result<String, BoxError> {
            Err("backend offline".into())
        }

        fn verify(&self, _: &[u8], _: &str) -> std::result::Result<bool, BoxError> {
            Err("backend offline".into())
        }
    }

    const SAMPLE_HASH: &str = "$2b$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

    fn service() -> BcryptService {
        BcryptService::new(10, Diagnostics::disabled()).unwrap()
    }

    #[test]
    fn default_rounds_are_validated() {
        assert!(BcryptService::new(3, Diagnostics::disabled()).is_err());
        assert_eq!(service().default_salt_rounds(), 10);
    }

    #[test]
    fn gen_salt_has_bcrypt_shape() {
        let salt = service().gen_salt(Some(5)).unwrap();
        assert!(salt.starts_with("$2b$05$"));
        assert_eq!(salt.len(), 29);
        assert!(assert_bcrypt_salt(&salt).is_ok());
    }

    #[test]
    fn gen_salt_uses_default_rounds() {
        assert!(service().gen_salt(None).unwrap().starts_with("$2b$10$"));
    }

    #[test]
    fn gen_salt_decodes_back_to_sixteen_bytes() {
        let svc = service();
        let salt = svc.gen_salt(Some(4)).unwrap();
        let (rounds, raw) = svc.decode_salt(&salt).unwrap();
        assert_eq!(rounds, 4);
        assert_eq!(raw.len(), BCRYPT_SALT_LEN);
    }

    #[test]
    fn get_salt_rounds_parses_cost() {
        assert_eq!(service().get_salt_rounds(SAMPLE_HASH).unwrap(), 10);
    }

    #[test]
    fn weak_rounds_warn_but_succeed() {
        let logger = Arc::new(RecordingLogger::default());
        let svc = BcryptService::new(10, Diagnostics::new(logger.clone(), false, false)).unwrap();
        svc.hash_sync("password", Some(4)).unwrap();
        let records = logger.records();
        assert!(records.iter().any(|r| r.level == Level::WARN));
    }

    #[test]
    fn hash_is_logged_only_with_show_secret() {
        let logger = Arc::new(RecordingLogger::default());
        let svc = BcryptService::new(10, Diagnostics::new(logger.clone(), true, false)).unwrap();
        let hash = svc.hash_sync("password", Some(4)).unwrap();
        assert!(!logger.contains_value(&hash));

        let logger = Arc::new(RecordingLogger::default());
        let svc = BcryptService::new(10, Diagnostics::new(logger.clone(), true, true)).unwrap();
        let hash = svc.hash_sync("password", Some(4)).unwrap();
        assert!(logger.contains_value(&hash));
    }

    #[test]
    fn backend_failures_become_hashing_errors() {
        let svc =
            BcryptService::with_backend(Arc::new(BrokenBackend), 10, Diagnostics::disabled())
                .unwrap();

        let err = svc.hash_sync("password", Some(4)).unwrap_err();
        assert_eq!(err.code(), "HASHING_ERROR");

        let err = svc.compare_sync("password", SAMPLE_HASH).unwrap_err();
        assert_eq!(err.code(), "HASHING_ERROR");

        let salt = svc.gen_salt(Some(4)).unwrap();
        let err = svc.hash_with_salt_sync("password", &salt).unwrap_err();
        assert_eq!(err.code(), "HASHING_ERROR");
    }

    #[test]
    fn validation_runs_before_backend() {
        let svc =
            BcryptService::with_backend(Arc::new(BrokenBackend), 10, Diagnostics::disabled())
                .unwrap();
        assert_eq!(svc.hash_sync("", Some(4)).unwrap_err().code(), "VALIDATION_ERROR");
        assert_eq!(
            svc.compare_sync("password", "not-a-bcrypt-hash")
                .unwrap_err()
                .code(),
            "VALIDATION_ERROR"
        );
    }

    #[tokio::test]
    async fn async_backend_failures_become_hashing_errors() {
        let svc =
            BcryptService::with_backend(Arc::new(BrokenBackend), 10, Diagnostics::disabled())
                .unwrap();
        let err = svc.hash("password", Some(4)).await.unwrap_err();
        assert!(matches!(err, CryptoError::Hashing { .. }));
    }
}
