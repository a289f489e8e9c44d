//! # Application Layer
//!
//! Provider-facing interfaces and the coordination use cases built on them.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
