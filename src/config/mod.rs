//! Configuration loaded from `.chromesync.toml`.

pub mod settings;

pub use settings::Settings;
