//! Remote store access.
//!
//! The sensor node and the dashboard share a hosted real-time database. This
//! module defines the [`RemoteStore`] trait the rest of the crate programs
//! against, and [`FirebaseStore`], a client for the Firebase Realtime
//! Database REST protocol.
//!
//! | Path | Operation |
//! |------|-----------|
//! | `sensor_data` | read the whole collection |
//! | `user_data/sleep_mode` | overwrite with a boolean |
//! | `alerts` | append an [`AlertEvent`] |
//!
//! # Example
//!
//! ```no_run
//! use sensordash_core::store::{FirebaseStore, RemoteStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FirebaseStore::new("https://my-node-default-rtdb.firebaseio.com", None)?;
//! let readings = store.fetch_readings().await?;
//! println!("{} readings", readings.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use sensordash_types::{AlertEvent, Reading};

use crate::error::{Error, Result};

/// Collection of sensor readings written by the node.
pub const SENSOR_DATA_PATH: &str = "sensor_data";
/// Sleep mode preference read by the node.
pub const SLEEP_MODE_PATH: &str = "user_data/sleep_mode";
/// Append-only alert log.
pub const ALERTS_PATH: &str = "alerts";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Operations the dashboard needs from the remote store.
///
/// Implemented by [`FirebaseStore`] for the real database and by
/// [`MockStore`](crate::mock::MockStore) for tests.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read every reading in store order. A missing collection yields an
    /// empty vector.
    async fn fetch_readings(&self) -> Result<Vec<Reading>>;

    /// Overwrite the sleep mode preference.
    async fn set_sleep_mode(&self, enabled: bool) -> Result<()>;

    /// Append an alert to the alert log.
    async fn push_alert(&self, event: &AlertEvent) -> Result<()>;
}

/// Firebase Realtime Database REST client.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: Client,
    base_url: String,
    auth: Option<String>,
}

impl FirebaseStore {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Database root, e.g. `https://<project>.firebaseio.com`
    /// * `auth` - Optional database secret or ID token, sent as `?auth=`
    pub fn new(base_url: &str, auth: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, auth, DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom request timeout.
    pub fn with_timeout(base_url: &str, auth: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, auth, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, auth: Option<String>, client: Client) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let auth = auth.filter(|a| !a.is_empty());
        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// REST endpoint for a database path.
    pub fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.node_url(path));
        match &self.auth {
            Some(token) => builder.query(&[("auth", token)]),
            None => builder,
        }
    }

    async fn get_value(&self, path: &str) -> Result<Value> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        handle_response(response).await
    }

    async fn put_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        let response = self
            .request(reqwest::Method::PUT, path)
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Value> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }
}

#[async_trait]
impl RemoteStore for FirebaseStore {
    async fn fetch_readings(&self) -> Result<Vec<Reading>> {
        let value = self.get_value(SENSOR_DATA_PATH).await?;
        let readings = readings_from_value(value)?;
        debug!(count = readings.len(), "Fetched sensor readings");
        Ok(readings)
    }

    async fn set_sleep_mode(&self, enabled: bool) -> Result<()> {
        self.put_json(SLEEP_MODE_PATH, &enabled).await?;
        debug!(enabled, "Sleep mode written");
        Ok(())
    }

    async fn push_alert(&self, event: &AlertEvent) -> Result<()> {
        let response = self.post_json(ALERTS_PATH, event).await?;
        debug!(key = ?response.get("name"), kind = %event.kind, "Alert logged");
        Ok(())
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim().trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::InvalidUrl(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json().await?)
    } else {
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string());

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Convert the `sensor_data` node into readings.
///
/// The database returns `null` for a missing node, an object keyed by push or
/// timestamp keys for ordinary collections (values are taken in key order),
/// and an array when every key is a small integer (holes are `null`).
/// Individual records that do not parse are skipped with a warning.
pub fn readings_from_value(value: Value) -> Result<Vec<Reading>> {
    let entries: Vec<(String, Value)> = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            entries
        }
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            return Err(Error::UnexpectedResponse(format!(
                "expected a collection at '{}', got {}",
                SENSOR_DATA_PATH, other
            )));
        }
    };

    let mut readings = Vec::with_capacity(entries.len());
    for (key, entry) in entries {
        if entry.is_null() {
            continue;
        }
        match serde_json::from_value::<Reading>(entry) {
            Ok(reading) => readings.push(reading),
            Err(e) => warn!(key = %key, error = %e, "Skipping malformed reading"),
        }
    }
    Ok(readings)
}
