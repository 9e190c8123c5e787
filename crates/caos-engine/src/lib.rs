//! The CAOS engine: script text in, response text out.
//!
//! [`Engine`] ties the parser, the interpreter and the world together;
//! [`network`] exposes it on a loopback TCP port.

pub mod config;
pub mod engine;
pub mod network;

pub use config::{ConfigError, EngineConfig, NetworkConfig};
pub use engine::Engine;
pub use network::{Exchange, ScriptListener};
