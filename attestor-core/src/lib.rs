//! # Attestor Core
//!
//! Core types, errors, and traits for the attestor write-once digest registry.
//!
//! This crate provides the foundational building blocks used by all other
//! attestor crates:
//!
//! - **Types**: Digests, submitter identities, registration records
//! - **Errors**: Comprehensive error types with context
//! - **Constants**: Sizes, sentinels, and persistence format versions
//! - **Traits**: The registry and content-store interfaces
//!
//! ## Example
//!
//! ```rust
//! use attestor_core::Digest;
//!
//! // Caller-supplied values parse leniently from hex
//! let digest = Digest::parse(" 0xAA00000000000000000000000000000000000000000000000000000000000000 ").unwrap();
//! assert_eq!(digest.to_hex(), "0xaa00000000000000000000000000000000000000000000000000000000000000");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{AttestorError, Result};
pub use event::RegistryEvent;
pub use traits::*;
pub use types::*;
