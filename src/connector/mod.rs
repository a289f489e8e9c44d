//! # Connector Layer
//!
//! Concrete provider adapters and startup wiring:
//! - HTTP adapters (Anthropic Messages, OpenAI-compatible Chat Completions)
//! - Scripted mock provider for tests and offline runs
//! - JSON/environment configuration and the dependency container

pub mod adapter;
pub mod config;
pub mod container;

pub use adapter::*;
pub use config::*;
pub use container::*;
