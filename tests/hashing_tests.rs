//! Integration tests for the bcrypt hashing service.

use std::sync::Arc;

use cryptokit::crypto::hashing::{HashBackend, BCRYPT_SALT_LEN};
use cryptokit::errors::BoxError;
use cryptokit::logging::Diagnostics;
use cryptokit::{BcryptService, CryptoError};

/// Low cost keeps the suite fast; cost 12 is exercised once below.
const FAST_ROUNDS: u32 = 4;

fn service() -> BcryptService {
    BcryptService::new(FAST_ROUNDS, Diagnostics::disabled()).expect("service")
}

/// Backend that skips the expensive work and just stamps the cost into a
/// structurally valid hash.
struct StampingBackend;

impl HashBackend for StampingBackend {
    fn hash(&self, _: &[u8], cost: u32) -> Result<String, BoxError> {
        Ok(format!("$2b${cost:02}${}", ".".repeat(53)))
    }

    fn hash_with_salt(
        &self,
        data: &[u8],
        cost: u32,
        _: [u8; BCRYPT_SALT_LEN],
    ) -> Result<String, BoxError> {
        self.hash(data, cost)
    }

    fn verify(&self, _: &[u8], _: &str) -> Result<bool, BoxError> {
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Hash / compare
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hash_then_compare_at_cost_twelve() {
    let svc = service();
    let hash = svc.hash("correct horse", Some(12)).await.expect("hash");

    assert!(hash.starts_with("$2b$12$"));
    assert!(svc.compare("correct horse", &hash).await.expect("compare"));
    assert!(!svc.compare("battery staple", &hash).await.expect("compare"));
}

#[test]
fn sync_variants_match_async_semantics() {
    let svc = service();
    let hash = svc.hash_sync("sync password", None).expect("hash");

    assert_eq!(svc.get_salt_rounds(&hash).unwrap(), FAST_ROUNDS);
    assert!(svc.compare_sync("sync password", &hash).unwrap());
    assert!(!svc.compare_sync("other password", &hash).unwrap());
}

#[test]
fn same_password_hashes_differently_each_time() {
    let svc = service();
    let a = svc.hash_sync("repeat", None).unwrap();
    let b = svc.hash_sync("repeat", None).unwrap();
    assert_ne!(a, b);
    assert!(svc.compare_sync("repeat", &a).unwrap());
    assert!(svc.compare_sync("repeat", &b).unwrap());
}

#[test]
fn unicode_passwords_verify() {
    let svc = service();
    let hash = svc.hash_sync("pässwörd 🔑", None).unwrap();
    assert!(svc.compare_sync("pässwörd 🔑", &hash).unwrap());
    assert!(!svc.compare_sync("passwort 🔑", &hash).unwrap());
}

#[tokio::test]
async fn compare_accepts_2a_and_2y_hashes() {
    let svc = service();
    let hash = svc.hash("legacy", None).await.unwrap();
    for prefix in ["$2a$", "$2y$"] {
        let legacy = hash.replacen("$2b$", prefix, 1);
        assert!(svc.compare("legacy", &legacy).await.unwrap(), "{prefix}");
    }
}

// ---------------------------------------------------------------------------
// Salts and salt rounds
// ---------------------------------------------------------------------------

#[tokio::test]
async fn gen_salt_output_hashes_and_verifies() {
    let svc = service();
    let salt = svc.gen_salt(Some(5)).unwrap();

    let hash = svc.hash_with_salt("salted", &salt).await.unwrap();
    assert!(hash.starts_with(&salt));
    assert_eq!(svc.get_salt_rounds(&hash).unwrap(), 5);
    assert!(svc.compare("salted", &hash).await.unwrap());

    // Same salt, same input, same hash.
    assert_eq!(svc.hash_with_salt_sync("salted", &salt).unwrap(), hash);
}

#[test]
fn real_hashes_report_their_rounds() {
    let svc = service();
    for rounds in 4..=6 {
        let hash = svc.hash_sync("rounds", Some(rounds)).unwrap();
        assert_eq!(svc.get_salt_rounds(&hash).unwrap(), rounds);
    }
}

#[test]
fn salt_rounds_roundtrip_over_full_range() {
    let svc = BcryptService::with_backend(Arc::new(StampingBackend), 10, Diagnostics::disabled())
        .unwrap();
    for rounds in 4..=31 {
        let hash = svc.hash_sync("data", Some(rounds)).unwrap();
        assert_eq!(svc.get_salt_rounds(&hash).unwrap(), rounds);
    }
}

#[test]
fn out_of_range_rounds_are_validation_errors() {
    let svc = service();
    for rounds in [0, 3, 32, 99] {
        assert!(matches!(
            svc.hash_sync("data", Some(rounds)).unwrap_err(),
            CryptoError::Validation { .. }
        ));
        assert!(matches!(
            svc.gen_salt(Some(rounds)).unwrap_err(),
            CryptoError::Validation { .. }
        ));
    }
}

// ---------------------------------------------------------------------------
// Malformed input
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_hash_is_validation_error_not_false() {
    let svc = service();

    let err = svc.compare("data", "not-a-bcrypt-hash").await.unwrap_err();
    assert!(matches!(err, CryptoError::Validation { .. }));

    let err = svc.get_salt_rounds("not-a-bcrypt-hash").unwrap_err();
    assert!(matches!(err, CryptoError::Validation { .. }));
}

#[test]
fn non_ascii_cost_digits_are_validation_errors_everywhere() {
    let svc = service();
    let hash = format!("$2b$\u{0661}\u{0662}${}", "a".repeat(53));

    let err = svc.compare_sync("data", &hash).unwrap_err();
    assert!(matches!(err, CryptoError::Validation { .. }));

    let err = svc.get_salt_rounds(&hash).unwrap_err();
    assert!(matches!(err, CryptoError::Validation { .. }));
}

#[tokio::test]
async fn empty_password_is_validation_error() {
    let svc = service();
    assert!(matches!(
        svc.hash("", Some(12)).await.unwrap_err(),
        CryptoError::Validation { .. }
    ));
    assert!(matches!(
        svc.hash_sync("  ", Some(12)).unwrap_err(),
        CryptoError::Validation { .. }
    ));
}

#[test]
fn malformed_salt_is_validation_error() {
    let svc = service();
    for bad in ["", "$2b$10$", "$2b$10$tooShort", "$3b$10$N9qo8uLOickgx2ZMRZoMye"] {
        assert!(matches!(
            svc.hash_with_salt_sync("data", bad).unwrap_err(),
            CryptoError::Validation { .. }
        ));
    }
}

#[test]
fn salt_with_out_of_range_cost_is_validation_error() {
    let svc = service();
    let err = svc
        .hash_with_salt_sync("data", "$2b$03$N9qo8uLOickgx2ZMRZoMye")
        .unwrap_err();
    assert!(matches!(err, CryptoError::Validation { .. }));
}
