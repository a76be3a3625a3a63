//! Registration-time construction of the services.
//!
//! `CryptoProviders` reads a `Settings` once and builds at most one
//! `BcryptService` and one `AesService`, honouring `use_bcrypt` and
//! `use_aes`.  The host application owns the returned value and decides
//! its scope.

use std::sync::Arc;

use crate::config::Settings;
use crate::crypto::hashing::{BcryptBackend, HashBackend};
use crate::crypto::{AesService, BcryptService};
use crate::errors::{CryptoError, Result};
use crate::logging::{Diagnostics, Logger, TracingLogger};

/// The services enabled by one `Settings`.
#[derive(Debug, Clone)]
pub struct CryptoProviders {
    bcrypt: Option<BcryptService>,
    aes: Option<AesService>,
}

/// Builder for `CryptoProviders` with swappable logger and hash backend.
pub struct ProvidersBuilder {
    settings: Settings,
    logger: Arc<dyn Logger>,
    hash_backend: Arc<dyn HashBackend>,
}

impl ProvidersBuilder {
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_hash_backend(mut self, backend: Arc<dyn HashBackend>) -> Self {
        self.hash_backend = backend;
        self
    }

    /// Validate the settings and construct the enabled services.
    pub fn build(self) -> Result<CryptoProviders> {
        let settings = self.settings;
        settings.validate()?;

        let diagnostics = Diagnostics::new(self.logger, settings.debug, settings.show_secret);

        let bcrypt = if settings.use_bcrypt {
            Some(BcryptService::with_backend(
                self.hash_backend,
                settings.bcrypt_salt_rounds,
                diagnostics.clone(),
            )?)
        } else {
            None
        };

        let aes = if settings.use_aes {
            Some(AesService::with_defaults(
                settings.aes_key_material().as_ref(),
                settings.aes_iv_material().as_ref(),
                diagnostics.clone(),
            )?)
        } else {
            None
        };

        diagnostics.debug(
            &[
                ("bcrypt", bcrypt.is_some().to_string()),
                ("aes", aes.is_some().to_string()),
            ],
            "crypto providers registered",
        );

        Ok(CryptoProviders { bcrypt, aes })
    }
}

impl CryptoProviders {
    /// Start building from `settings` with the default logger and backend.
    pub fn builder(settings: Settings) -> ProvidersBuilder {
        ProvidersBuilder {
            settings,
            logger: Arc::new(TracingLogger),
            hash_backend: Arc::new(BcryptBackend),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::builder(settings.clone()).build()
    }

    pub fn bcrypt(&self) -> Option<&BcryptService> {
        self.bcrypt.as_ref()
    }

    pub fn aes(&self) -> Option<&AesService> {
        self.aes.as_ref()
    }

    /// The hashing service, or an error naming the disabling option.
    pub fn require_bcrypt(&self) -> Result<&BcryptService> {
        self.bcrypt
            .as_ref()
            .ok_or_else(|| CryptoError::validation("bcrypt service is disabled (use_bcrypt = false)"))
    }

    /// The encryption service, or an error naming the disabling option.
    pub fn require_aes(&self) -> Result<&AesService> {
        self.aes
            .as_ref()
            .ok_or_else(|| CryptoError::validation("aes service is disabled (use_aes = false)"))
    }
}
