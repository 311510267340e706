//! # Attestor Report
//!
//! Producer-side helpers: everything that happens *before* a digest reaches
//! the registry.
//!
//! - Canonical JSON bytes, so the same report always hashes the same
//! - SHA-256 and Keccak-256 digests over report content
//! - Pin-name generation for content-addressed storage
//! - A [`Submitter`] that composes upload + registration into one call
//!
//! The registry itself never computes digests; this crate is where they
//! come from.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod canonical;
mod digest;
mod name;
mod submit;

pub use canonical::{canonical_json, canonical_string};
pub use digest::{keccak256_digest, report_digest, sha256_digest};
pub use name::{pin_name, slugify};
pub use submit::{SubmitOutcome, Submitter};
