//! Batch writer for the InfluxDB v2 HTTP write API.
//!
//! The writer owns the long-lived HTTP client. `connect()` must succeed
//! before the first write (startup is fatal otherwise); a write attempted
//! without a connection reports [`WriteError::NotInitialized`] instead of
//! panicking, and the cycle goes on.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::InfluxConfig;
use crate::point::{WritePoint, encode_lines};

/// Timeout for every request to the backend, ping included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Write path errors.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("InfluxDB client not initialized")]
    NotInitialized,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("InfluxDB rejected the request ({status}): {body}")]
    Backend { status: StatusCode, body: String },
}

/// Writes metric batches to InfluxDB.
pub struct InfluxWriter {
    config: InfluxConfig,
    client: Option<Client>,
}

impl InfluxWriter {
    /// Create a writer without a connection. Call [`connect`](Self::connect)
    /// before writing.
    pub fn new(config: InfluxConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Establish the session: build the HTTP client and ping the backend.
    pub async fn connect(&mut self) -> Result<(), WriteError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let ping_url = format!("{}/ping", self.base_url());
        let response = client.get(&ping_url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WriteError::Backend { status, body });
        }

        info!(url = %self.config.url, "Connected to InfluxDB");
        self.client = Some(client);
        Ok(())
    }

    /// Submit one batch of points, timestamped now.
    ///
    /// Returns the number of points written. The whole batch succeeds or
    /// fails as one outcome; an empty batch is a no-op.
    pub async fn write_points(&self, points: &[WritePoint]) -> Result<usize, WriteError> {
        let Some(client) = &self.client else {
            return Err(WriteError::NotInitialized);
        };
        if points.is_empty() {
            return Ok(0);
        }

        let timestamp_ns = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let body = encode_lines(points, timestamp_ns);

        let response = client
            .post(format!("{}/api/v2/write", self.base_url()))
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        if response.status().is_success() {
            debug!(points = points.len(), bucket = %self.config.bucket, "Batch written");
            Ok(points.len())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(WriteError::Backend { status, body })
        }
    }

    /// Whether `connect()` has succeeded and `close()` has not been called.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Release the connection. Further writes report `NotInitialized`.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            info!("InfluxDB connection closed");
        }
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }
}
