//! Configuration for cryptokit.

pub mod settings;

pub use settings::Settings;
