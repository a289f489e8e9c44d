//! # Domain Layer
//!
//! Conversation, category and response models shared by every layer.
//! Nothing here performs I/O or knows about concrete providers.

pub mod error;
pub mod models;

pub use error::*;
pub use models::*;
