//! HTTP client for the remote store.

use super::{BackupPage, BackupReceipt, LatestBackup, RemoteStore};
use crate::{Result, VaultError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

pub struct HttpStore {
    client: Client,
    base_url: String,
    vault_id: String,
}

impl HttpStore {
    /// `vault_id` is sent as the bearer credential on every request.
    pub fn new(base_url: &str, vault_id: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            vault_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-success status into a network error.
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(VaultError::Network(format!(
        "HTTP {}: {}",
        status,
        response.url()
    )))
}

impl RemoteStore for HttpStore {
    async fn create_backup(&self, blob: &str, device_id: &str) -> Result<BackupReceipt> {
        let url = self.url("/api/backups");
        debug!("POST {} ({} bytes)", url, blob.len());

        let body = serde_json::json!({
            "blob": blob,
            "deviceId": device_id,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.vault_id)
            .json(&body)
            .send()
            .await?;

        Ok(check(response)?.json().await?)
    }

    async fn get_latest_backup(&self) -> Result<Option<LatestBackup>> {
        let url = self.url("/api/backups/latest");
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.vault_id)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(check(response)?.json().await?))
    }

    async fn list_backups(&self, limit: u32, offset: u32) -> Result<BackupPage> {
        let url = self.url("/api/backups");
        debug!("GET {} (limit {}, offset {})", url, limit, offset);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.vault_id)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;

        Ok(check(response)?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const VAULT: &str = "vault-123";

    #[derive(Clone, Default)]
    struct Server {
        blobs: Arc<Mutex<Vec<(String, String)>>>,
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("Bearer {}", VAULT))
            .unwrap_or(false)
    }

    async fn create(
        State(server): State<Server>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
        }
        let blob = body["blob"].as_str().unwrap_or_default().to_string();
        let device = body["deviceId"].as_str().unwrap_or_default().to_string();
        let size = blob.len();
        let mut blobs = server.blobs.lock().unwrap();
        blobs.push((blob, device));
        (
            StatusCode::CREATED,
            Json(json!({
                "id": format!("b{}", blobs.len()),
                "createdAt": "2026-10-16T12:00:00Z",
                "sizeBytes": size,
            })),
        )
    }

    async fn latest(State(server): State<Server>) -> (StatusCode, Json<Value>) {
        match server.blobs.lock().unwrap().last() {
            Some((blob, device)) => (
                StatusCode::OK,
                Json(json!({
                    "blob": blob,
                    "createdAt": "2026-10-16T12:00:00Z",
                    "deviceId": device,
                })),
            ),
            None => (StatusCode::NOT_FOUND, Json(json!({ "error": "none" }))),
        }
    }

    async fn list(
        State(server): State<Server>,
        Query(params): Query<HashMap<String, u32>>,
    ) -> Json<Value> {
        let blobs = server.blobs.lock().unwrap();
        let limit = params.get("limit").copied().unwrap_or(10) as usize;
        let offset = params.get("offset").copied().unwrap_or(0) as usize;
        let items: Vec<Value> = blobs
            .iter()
            .enumerate()
            .skip(offset)
            .take(limit)
            .map(|(i, (blob, device))| {
                json!({
                    "id": format!("b{}", i + 1),
                    "createdAt": "2026-10-16T12:00:00Z",
                    "deviceId": device,
                    "sizeBytes": blob.len(),
                })
            })
            .collect();
        Json(json!({ "items": items, "total": blobs.len() }))
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/api/backups", post(create).get(list))
            .route("/api/backups/latest", get(latest))
            .with_state(Server::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn store(url: &str, vault_id: &str) -> HttpStore {
        HttpStore::new(url, vault_id.to_string(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_create_latest_and_list() -> Result<()> {
        let url = spawn_server().await;
        let store = store(&url, VAULT);

        assert!(store.get_latest_backup().await?.is_none());

        let receipt = store.create_backup("Zmlyc3Q=", "laptop").await?;
        assert_eq!(receipt.id, "b1");
        assert_eq!(receipt.size_bytes, 8);
        store.create_backup("c2Vjb25k", "desktop").await?;

        let latest = store.get_latest_backup().await?.unwrap();
        assert_eq!(latest.blob, "c2Vjb25k");
        assert_eq!(latest.device_id, "desktop");

        let page = store.list_backups(1, 1).await?;
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].device_id, "desktop");
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_credential_is_network_error() {
        let url = spawn_server().await;
        let result = store(&url, "wrong-vault").create_backup("eA==", "laptop").await;
        assert!(matches!(result, Err(VaultError::Network(msg)) if msg.contains("401")));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let result = store("http://127.0.0.1:9", VAULT).get_latest_backup().await;
        assert!(matches!(result, Err(VaultError::Network(_))));
    }
}
