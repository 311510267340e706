//! Report submission pipeline.
//!
//! Composes the producer steps into one call: canonical digest, optional
//! content-store upload, then the registry write. The registry's
//! write-once conflict is surfaced as a normal outcome here - a report
//! that is already proven is not an error for the producer.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use attestor_core::error::Result;
use attestor_core::traits::{ContentStore, ReportRegistry};
use attestor_core::types::{Digest, Receipt, SubmitterId, Verification};

use crate::digest::report_digest;
use crate::name::pin_name;

/// Result of a submission.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The report digest was registered by this call.
    Registered {
        /// Digest that was registered.
        digest: Digest,
        /// Write receipt from the registry.
        receipt: Receipt,
        /// Content identifier, if an upload happened.
        pointer: Option<String>,
    },
    /// The digest was already registered; the existing proof is returned.
    ///
    /// Whoever registered first owns the record; this submission changed
    /// nothing.
    AlreadyProven {
        /// Digest that was submitted.
        digest: Digest,
        /// The pre-existing registration.
        verification: Verification,
    },
}

/// Submits reports: digest, optionally upload, then register.
pub struct Submitter {
    registry: Arc<dyn ReportRegistry>,
    store: Option<Arc<dyn ContentStore>>,
}

impl Submitter {
    /// Creates a submitter that registers digests only (no uploads).
    pub fn new(registry: Arc<dyn ReportRegistry>) -> Self {
        Self {
            registry,
            store: None,
        }
    }

    /// Adds a content store; subsequent submissions upload the full report
    /// and register its identifier as the storage pointer.
    pub fn with_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Submits a report on behalf of `owner`.
    ///
    /// `label` feeds the upload's pin name; it is ignored when no content
    /// store is configured.
    ///
    /// An existing registration short-circuits *before* any upload, so a
    /// duplicate submission never orphans content in the store. The race
    /// between that check and the write is still settled by the registry;
    /// losing it also reports [`SubmitOutcome::AlreadyProven`].
    pub async fn submit(
        &self,
        report: &Value,
        owner: SubmitterId,
        label: Option<&str>,
    ) -> Result<SubmitOutcome> {
        let digest = report_digest(report)?;
        debug!(digest = %digest, "report digest computed");

        let existing = self.registry.verify(digest).await?;
        if existing.registered {
            info!(digest = %digest, owner = %existing.owner, "report already proven");
            return Ok(SubmitOutcome::AlreadyProven {
                digest,
                verification: existing,
            });
        }

        let pointer = match &self.store {
            Some(store) => {
                let name = label.map(|l| pin_name(l, Utc::now()));
                let cid = store.upload_json(report, name.as_deref()).await?;
                debug!(digest = %digest, pointer = %cid, "report content uploaded");
                Some(cid)
            }
            None => None,
        };

        let written = match &pointer {
            Some(p) => self.registry.register_with_pointer(digest, owner, p).await,
            None => self.registry.register(digest, owner).await,
        };

        match written {
            Ok(receipt) => Ok(SubmitOutcome::Registered {
                digest,
                receipt,
                pointer,
            }),
            Err(e) if e.is_conflict() => {
                // Lost the race to another producer; read the proof back.
                let verification = self.registry.verify(digest).await?;
                Ok(SubmitOutcome::AlreadyProven {
                    digest,
                    verification,
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use attestor_registry::MemoryRegistry;

    fn alice() -> SubmitterId {
        SubmitterId::from_array([0xA1; 20])
    }

    fn bob() -> SubmitterId {
        SubmitterId::from_array([0xB2; 20])
    }

    /// Content store stub that records uploads and returns a fixed CID.
    struct StubStore {
        uploads: Mutex<Vec<Option<String>>>,
    }

    impl StubStore {
        fn new() -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContentStore for StubStore {
        async fn upload_json(&self, _value: &Value, name: Option<&str>) -> Result<String> {
            self.uploads.lock().push(name.map(str::to_string));
            Ok("stub-cid-1".to_string())
        }

        async fn fetch(&self, _pointer: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_submit_without_store_registers_digest_only() {
        let registry = Arc::new(MemoryRegistry::new());
        let submitter = Submitter::new(registry.clone());
        let report = json!({"company": "Acme", "score": 87});

        let outcome = submitter.submit(&report, alice(), None).await.unwrap();

        let SubmitOutcome::Registered {
            digest, pointer, ..
        } = outcome
        else {
            panic!("expected a fresh registration");
        };
        assert_eq!(digest, report_digest(&report).unwrap());
        assert_eq!(pointer, None);
        assert_eq!(registry.get_pointer(digest).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_submit_with_store_registers_pointer() {
        let registry = Arc::new(MemoryRegistry::new());
        let store = Arc::new(StubStore::new());
        let submitter = Submitter::new(registry.clone()).with_store(store.clone());
        let report = json!({"company": "Acme Corp", "score": 92});

        let outcome = submitter
            .submit(&report, alice(), Some("Acme Corp"))
            .await
            .unwrap();

        let SubmitOutcome::Registered {
            digest, pointer, ..
        } = outcome
        else {
            panic!("expected a fresh registration");
        };
        assert_eq!(pointer.as_deref(), Some("stub-cid-1"));
        assert_eq!(registry.get_pointer(digest).await.unwrap(), "stub-cid-1");

        let uploads = store.uploads.lock();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].as_deref().unwrap().starts_with("report_Acme-Corp_"));
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_already_proven_without_upload() {
        let registry = Arc::new(MemoryRegistry::new());
        let store = Arc::new(StubStore::new());
        let report = json!({"company": "Acme", "score": 87});

        let plain = Submitter::new(registry.clone());
        plain.submit(&report, alice(), None).await.unwrap();

        let with_store = Submitter::new(registry.clone()).with_store(store.clone());
        let outcome = with_store.submit(&report, bob(), None).await.unwrap();

        let SubmitOutcome::AlreadyProven { verification, .. } = outcome else {
            panic!("expected already-proven");
        };
        assert_eq!(verification.owner, alice());

        // The duplicate never reached the content store.
        assert!(store.uploads.lock().is_empty());
    }
}
