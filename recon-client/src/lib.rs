//! Recon HTTP Client
//!
//! A small, type-safe HTTP client for the backend that executes the
//! discovery tools. The pipeline engine only ever observes jobs through this
//! client: start a scan, list scans for a tool/target pair, read a scan's
//! detail, and trigger consolidation.
//!
//! # Example
//!
//! ```no_run
//! use recon_client::BackendClient;
//! use recon_core::domain::target::Target;
//! use recon_core::domain::tool::Tool;
//! use recon_core::dto::scan::StartScan;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BackendClient::new("http://localhost:8443");
//!     let target = Target::new(Uuid::new_v4(), "*.example.com");
//!
//!     let started = client
//!         .start_scan(Tool::Amass, &StartScan::for_tool(Tool::Amass, &target, Default::default()))
//!         .await?;
//!
//!     println!("Started scan: {}", started.scan_id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod consolidation;
mod scans;

// Re-export commonly used types
pub use error::{ClientError, FailureKind, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::trace;

/// HTTP client for the backend job-control API
///
/// Endpoints are grouped as:
/// - Scan lifecycle (start, list by tool, detail)
/// - Consolidation (merge, consolidated subdomains, target URLs)
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// Base URL of the backend (e.g., "http://localhost:8443")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl BackendClient {
    /// Create a new backend client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the backend API (e.g., "http://localhost:8443")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new backend client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use recon_client::BackendClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = BackendClient::with_client("http://localhost:8443", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and decode the JSON body
    ///
    /// The body is read as text first so that a malformed payload is reported
    /// as `ParseError` rather than as a transport failure.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let body = response.text().await?;
        trace!("Response body: {}", body);

        serde_json::from_str(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle a response whose body is irrelevant
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
