//! # Attestor Registry
//!
//! Write-once digest registry backends.
//!
//! This crate provides the storage backends that enforce the registry
//! contract - one registration record per digest, forever:
//!
//! - **Memory**: Fast in-memory storage for development and testing
//! - **File**: Persistent file-based storage for single-node deployments
//!
//! ## Example
//!
//! ```rust,ignore
//! use attestor_registry::{MemoryRegistry, Registry};
//!
//! let registry = MemoryRegistry::new();
//!
//! // First write wins, permanently
//! let receipt = registry.register(digest, owner).await?;
//!
//! // Anyone can verify afterwards
//! let proof = registry.verify(digest).await?;
//! assert!(proof.registered);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;

pub use file::FileRegistry;
pub use memory::MemoryRegistry;

// Re-export the trait from core
pub use attestor_core::traits::ReportRegistry as Registry;
