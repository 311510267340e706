//! Registry notification events.
//!
//! One event is emitted per successful write, after the state change is
//! fully applied, and never on failure. External auditors and indexers
//! consume these; the registry itself never reads them back.

use serde::{Deserialize, Serialize};

use crate::types::{Digest, SubmitterId};

/// Notification emitted by a registry write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A digest was registered without a storage pointer.
    Registered {
        /// The newly registered digest.
        digest: Digest,
        /// Identity that performed the registration.
        owner: SubmitterId,
        /// Timestamp assigned to the registration.
        registered_at: u64,
    },
    /// A digest was registered together with a storage pointer.
    RegisteredWithPointer {
        /// The newly registered digest.
        digest: Digest,
        /// Identity that performed the registration.
        owner: SubmitterId,
        /// The storage pointer recorded in the same transition.
        pointer: String,
        /// Timestamp assigned to the registration.
        registered_at: u64,
    },
}

impl RegistryEvent {
    /// The digest this event is about.
    pub fn digest(&self) -> Digest {
        match self {
            RegistryEvent::Registered { digest, .. } => *digest,
            RegistryEvent::RegisteredWithPointer { digest, .. } => *digest,
        }
    }

    /// The identity that performed the write.
    pub fn owner(&self) -> SubmitterId {
        match self {
            RegistryEvent::Registered { owner, .. } => *owner,
            RegistryEvent::RegisteredWithPointer { owner, .. } => *owner,
        }
    }

    /// The timestamp assigned to the write.
    pub fn registered_at(&self) -> u64 {
        match self {
            RegistryEvent::Registered { registered_at, .. } => *registered_at,
            RegistryEvent::RegisteredWithPointer { registered_at, .. } => *registered_at,
        }
    }
}
