use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::random::{AES_IV_LEN, AES_KEY_LEN};
use crate::crypto::validate::{assert_salt_rounds, normalize_key_material, KeyMaterial};
use crate::errors::{CryptoError, Result};

/// Registration-time options for the cryptokit services, loaded from
/// `.cryptokit.toml`.
///
/// Every field has a default so the services work without any config
/// file at all.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Register the bcrypt hashing service.
    #[serde(default = "default_true")]
    pub use_bcrypt: bool,

    /// Register the AES encryption service.
    #[serde(default = "default_true")]
    pub use_aes: bool,

    /// Cost factor used when a caller does not pass one (default: 10).
    #[serde(default = "default_bcrypt_salt_rounds")]
    pub bcrypt_salt_rounds: u32,

    /// Default AES-256 key as 64 hex characters.
    #[serde(default)]
    pub aes_key: Option<String>,

    /// Default CBC IV as 32 hex characters.
    #[serde(default)]
    pub aes_iv: Option<String>,

    /// Emit diagnostic events.
    #[serde(default)]
    pub debug: bool,

    /// Attach generated key / IV / secret / hash values to diagnostic
    /// events.  Has no effect unless `debug` is on.
    #[serde(default)]
    pub show_secret: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_bcrypt_salt_rounds() -> u32 {
    10
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_bcrypt: true,
            use_aes: true,
            bcrypt_salt_rounds: default_bcrypt_salt_rounds(),
            aes_key: None,
            aes_iv: None,
            debug: false,
            show_secret: false,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("use_bcrypt", &self.use_bcrypt)
            .field("use_aes", &self.use_aes)
            .field("bcrypt_salt_rounds", &self.bcrypt_salt_rounds)
            .field("aes_key", &self.aes_key.as_ref().map(|_| "<redacted>"))
            .field("aes_iv", &self.aes_iv.as_ref().map(|_| "<redacted>"))
            .field("debug", &self.debug)
            .field("show_secret", &self.show_secret)
            .finish()
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".cryptokit.toml";

    /// Load settings from `<project_dir>/.cryptokit.toml`.
    ///
    /// If the file does not exist, defaults are returned.  If it exists
    /// but cannot be read or parsed, a validation error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            CryptoError::validation(format!("Failed to read {}: {e}", config_path.display()))
        })?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            CryptoError::validation(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Check the cost factor and any default key material.
    pub fn validate(&self) -> Result<()> {
        assert_salt_rounds(self.bcrypt_salt_rounds)?;
        normalize_key_material(self.aes_key_material().as_ref(), "aesKey", Some(AES_KEY_LEN))?;
        normalize_key_material(self.aes_iv_material().as_ref(), "aesIv", Some(AES_IV_LEN))?;
        Ok(())
    }

    pub fn aes_key_material(&self) -> Option<KeyMaterial> {
        self.aes_key.as_deref().map(KeyMaterial::from)
    }

    pub fn aes_iv_material(&self) -> Option<KeyMaterial> {
        self.aes_iv.as_deref().map(KeyMaterial::from)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
