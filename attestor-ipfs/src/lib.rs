//! # Attestor IPFS
//!
//! Content-addressed storage for full report documents, behind the
//! [`ContentStore`](attestor_core::traits::ContentStore) seam.
//!
//! The registry records only digests; when a producer also wants the full
//! report retrievable, this crate pins it to IPFS via Pinata and hands
//! back the CID that becomes the registration's storage pointer.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod pinata;

pub use pinata::{ipfs_url, PinataConfig, PinataStore};
