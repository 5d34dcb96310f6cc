//! Project-level configuration (`.sitevault.toml`).

pub mod settings;

pub use settings::Settings;
