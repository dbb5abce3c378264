//! Configuration for the LLM Sentinel Gateway.
//!
//! Settings resolve in three layers: built-in defaults, then an optional
//! TOML file, then environment variables. A missing config file is not an
//! error; a malformed one is.

pub mod settings;

pub use settings::{Settings, DISABLED_ENDPOINT};
