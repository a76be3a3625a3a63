//! Diagnostic logging capability injected into the services.
//!
//! Services never call a global logger directly.  They hold an
//! `Arc<dyn Logger>` (by default `TracingLogger`) plus a `Diagnostics`
//! policy that decides which events and values may be emitted.

use std::sync::Arc;

use tracing::Level;

/// Sink for structured diagnostic events.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, fields: &[(&str, String)], message: &str);
}

/// Forwards events to the `tracing` ecosystem under the `cryptokit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, fields: &[(&str, String)], message: &str) {
        let fields = render_fields(fields);
        match level {
            Level::ERROR => tracing::error!(target: "cryptokit", %fields, "{message}"),
            Level::WARN => tracing::warn!(target: "cryptokit", %fields, "{message}"),
            Level::INFO => tracing::info!(target: "cryptokit", %fields, "{message}"),
            Level::DEBUG => tracing::debug!(target: "cryptokit", %fields, "{message}"),
            _ => tracing::trace!(target: "cryptokit", %fields, "{message}"),
        }
    }
}

fn render_fields(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Logging policy shared by the services.
///
/// `debug` gates diagnostic events; `show_secret` additionally allows
/// key, IV, secret and hash values to be attached to them.
#[derive(Clone)]
pub struct Diagnostics {
    logger: Arc<dyn Logger>,
    debug: bool,
    show_secret: bool,
}

impl Diagnostics {
    pub fn new(logger: Arc<dyn Logger>, debug: bool, show_secret: bool) -> Self {
        Self {
            logger,
            debug,
            show_secret,
        }
    }

    /// Policy with everything off, writing to `TracingLogger`.
    pub fn disabled() -> Self {
        Self::new(Arc::new(TracingLogger), false, false)
    }

    pub fn secrets_visible(&self) -> bool {
        self.debug && self.show_secret
    }

    /// Warnings are emitted regardless of the `debug` flag.
    pub fn warn(&self, fields: &[(&str, String)], message: &str) {
        self.logger.log(Level::WARN, fields, message);
    }

    pub fn debug(&self, fields: &[(&str, String)], message: &str) {
        if self.debug {
            self.logger.log(Level::DEBUG, fields, message);
        }
    }

    /// Debug event that carries `secret` under `name` only when secrets
    /// are visible.
    pub fn debug_secret(&self, name: &str, secret: &str, message: &str) {
        if !self.debug {
            return;
        }
        if self.show_secret {
            self.logger
                .log(Level::DEBUG, &[(name, secret.to_string())], message);
        } else {
            self.logger.log(Level::DEBUG, &[], message);
        }
    }
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("debug", &self.debug)
            .field("show_secret", &self.show_secret)
            .finish_non_exhaustive()
    }
}
