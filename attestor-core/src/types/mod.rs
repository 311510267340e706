//! Domain types for attestor.
//!
//! This module provides the core data structures used throughout the system:
//!
//! - [`Digest`]: 256-bit document fingerprint, the registry's primary key
//! - [`SubmitterId`]: 160-bit caller identity with EIP-55 rendering
//! - [`RegistrationRecord`]: immutable (owner, timestamp) pair
//! - [`Verification`] / [`Receipt`]: read- and write-side result shapes

mod digest;
mod record;
mod submitter;

pub use digest::*;
pub use record::*;
pub use submitter::*;
