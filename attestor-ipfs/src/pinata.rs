//! Pinata content store implementation.
//!
//! Uploads go through Pinata's pin-JSON endpoint with JWT Bearer auth;
//! retrieves go through an IPFS gateway. The returned CID is opaque to the
//! registry - only this crate ever inspects its shape.

use serde::Deserialize;
use tracing::{debug, instrument};

use async_trait::async_trait;

use attestor_core::error::{AttestorError, Result};
use attestor_core::traits::ContentStore;

/// Default Pinata pin-JSON endpoint.
const DEFAULT_ENDPOINT: &str = "https://api.pinata.cloud/pinning/pinJSONToIPFS";

/// Default public IPFS gateway for retrieves.
const DEFAULT_GATEWAY: &str = "https://gateway.pinata.cloud";

/// Pinata client configuration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PinataConfig {
    /// Pinata JWT for uploads. Uploads fail without it; retrieves work.
    pub jwt: Option<String>,
    /// Pin-JSON endpoint URL.
    pub endpoint: String,
    /// Gateway base URL for retrieves.
    pub gateway_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for PinataConfig {
    fn default() -> Self {
        Self {
            jwt: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            gateway_url: DEFAULT_GATEWAY.to_string(),
            timeout_seconds: 60,
        }
    }
}

impl PinataConfig {
    /// Creates a config with the given upload JWT.
    pub fn new(jwt: impl Into<String>) -> Self {
        Self {
            jwt: Some(jwt.into()),
            ..Self::default()
        }
    }

    /// Loads configuration from the environment (and `.env` if present).
    ///
    /// Reads `PINATA_JWT`, `PINATA_ENDPOINT`, and `PINATA_GATEWAY`;
    /// unset values fall back to the defaults. Values are trimmed, since
    /// credentials pasted into `.env` files routinely carry stray
    /// whitespace.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let jwt = std::env::var("PINATA_JWT")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Self {
            jwt,
            endpoint: std::env::var("PINATA_ENDPOINT")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            gateway_url: std::env::var("PINATA_GATEWAY")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| DEFAULT_GATEWAY.to_string()),
            timeout_seconds: 60,
        }
    }

    /// Overrides the gateway base URL.
    pub fn with_gateway(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = gateway_url.into();
        self
    }
}

/// Returns the `ipfs://` URL for a CID.
pub fn ipfs_url(cid: &str) -> String {
    format!("ipfs://{cid}")
}

/// Shape of a successful pin-JSON response.
#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Pinata-backed content store.
pub struct PinataStore {
    config: PinataConfig,
    http_client: reqwest::Client,
}

impl PinataStore {
    /// Creates a store with the given config.
    pub fn with_config(config: PinataConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    /// Creates a store from environment configuration.
    pub fn from_env() -> Self {
        Self::with_config(PinataConfig::from_env())
    }

    pub(crate) fn validate_cid(&self, cid: &str) -> Result<()> {
        if cid.is_empty() {
            return Err(AttestorError::InvalidContentId("CID cannot be empty".into()));
        }

        if cid.starts_with("Qm") {
            if cid.len() != 46 {
                return Err(AttestorError::InvalidContentId(format!(
                    "invalid CIDv0 length: expected 46, got {}",
                    cid.len()
                )));
            }
        } else if cid.starts_with("bafy") || cid.starts_with("bafk") {
            if cid.len() < 50 {
                return Err(AttestorError::InvalidContentId(format!(
                    "CIDv1 too short: {}",
                    cid.len()
                )));
            }
        } else if !cid.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AttestorError::InvalidContentId(
                "CID contains invalid characters".into(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl ContentStore for PinataStore {
    /// Pins a JSON document and returns its CID.
    #[instrument(skip(self, value))]
    async fn upload_json(&self, value: &serde_json::Value, name: Option<&str>) -> Result<String> {
        let jwt = self
            .config
            .jwt
            .as_ref()
            .ok_or_else(|| AttestorError::ConfigError("PINATA_JWT not configured".into()))?;

        let mut payload = serde_json::json!({ "pinataContent": value });
        if let Some(name) = name {
            payload["pinataMetadata"] = serde_json::json!({ "name": name });
        }

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", jwt))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AttestorError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AttestorError::UploadFailed(format!(
                "{} -> {}: {}",
                self.config.endpoint, status, text
            )));
        }

        let json: PinResponse = response
            .json()
            .await
            .map_err(|e| AttestorError::UploadFailed(format!("response without CID: {}", e)))?;

        debug!(cid = %json.ipfs_hash, "pinned report JSON");
        Ok(json.ipfs_hash)
    }

    /// Fetches pinned bytes through the configured gateway.
    #[instrument(skip(self))]
    async fn fetch(&self, pointer: &str) -> Result<Vec<u8>> {
        self.validate_cid(pointer)?;

        let base = self.config.gateway_url.trim_end_matches('/');
        let url = format!("{}/ipfs/{}", base, pointer);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AttestorError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AttestorError::FetchFailed {
                pointer: pointer.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        debug!(cid = pointer, "fetched from gateway");
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| AttestorError::HttpError(e.to_string()))
    }
}
