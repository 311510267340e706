//! Common traits for attestor.
//!
//! These traits define the seams between the registry core and everything
//! around it: producers write through [`ReportRegistry`], verifiers read
//! through it, and content-addressed storage stays behind [`ContentStore`].

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Digest, Receipt, SubmitterId, Verification};

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// The write-once digest registry.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - File-backed storage (for single-node deployments)
/// - A shared ledger (for publicly verifiable deployments)
///
/// Whatever the backend, the contract is the same: a digest gets at most one
/// registration record for the life of the registry, the record never
/// changes once written, and every write is atomic - it either commits fully
/// or fails fully with no partial state observable.
#[async_trait]
pub trait ReportRegistry: Send + Sync {
    /// Registers a digest without a storage pointer.
    ///
    /// Atomically creates the registration record with `owner` and a
    /// system-assigned, monotonically non-decreasing timestamp.
    ///
    /// # Errors
    /// [`AlreadyRegistered`](crate::AttestorError::AlreadyRegistered) if the
    /// digest already has a record; the existing record is left untouched
    /// and no event is emitted.
    async fn register(&self, digest: Digest, owner: SubmitterId) -> Result<Receipt>;

    /// Registers a digest and sets its storage pointer in the same
    /// atomic transition.
    ///
    /// `pointer` is accepted as an opaque string; no format or reachability
    /// validation is performed. A pointer can never be attached or changed
    /// after registration.
    ///
    /// # Errors
    /// Identical to [`register`](Self::register); on failure the pointer
    /// mapping is also left untouched.
    async fn register_with_pointer(
        &self,
        digest: Digest,
        owner: SubmitterId,
        pointer: &str,
    ) -> Result<Receipt>;

    /// Looks up the registration record for a digest.
    ///
    /// Total read: unknown digests answer with `registered = false` and
    /// sentinel values, never an error.
    async fn verify(&self, digest: Digest) -> Result<Verification>;

    /// Returns the storage pointer for a digest, or the empty string.
    ///
    /// The empty string is returned both when the digest was never
    /// registered and when it was registered without a pointer; callers
    /// that need to distinguish the two must call
    /// [`verify`](Self::verify) first.
    async fn get_pointer(&self, digest: Digest) -> Result<String>;

    /// Returns the total number of registration records.
    async fn count(&self) -> Result<u64>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTENT STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque content-addressed storage.
///
/// The registry never calls this; only producers do, to obtain the
/// identifier string that becomes a storage pointer. The registry treats
/// whatever comes back as opaque.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Uploads a JSON document and returns its content identifier.
    async fn upload_json(&self, value: &serde_json::Value, name: Option<&str>) -> Result<String>;

    /// Fetches the raw bytes behind a content identifier.
    async fn fetch(&self, pointer: &str) -> Result<Vec<u8>>;
}
