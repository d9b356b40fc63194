//! Scripted in-memory transport for unit tests.

use super::transport::{Transport, TransportResponse};
use crate::error::CatalogResult;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
struct Scripted {
    status: StatusCode,
    body: String,
    delay: Duration,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Responses are queued per path. The last queued response for a path is
/// repeated once the queue drains; unknown paths answer 404.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: StatusCode, body: Value) {
        self.respond_after(path, status, body, Duration::ZERO);
    }

    pub fn respond_after(&self, path: &str, status: StatusCode, body: Value, delay: Duration) {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted {
                status,
                body: body.to_string(),
                delay,
            });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.path == path).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str, query: &[(String, String)]) -> CatalogResult<TransportResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            query: query.to_vec(),
        });

        let scripted = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(path) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let scripted = scripted.unwrap_or_else(|| Scripted {
            status: StatusCode::NOT_FOUND,
            body: json!({ "status": 404, "type": "BadResponseException", "message": "Resource does not exist" })
                .to_string(),
            delay: Duration::ZERO,
        });

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        Ok(TransportResponse {
            status: scripted.status,
            body: scripted.body,
        })
    }
}

/// Upstream-shaped record
pub fn entry(mal_id: u32, title: &str) -> Value {
    json!({
        "mal_id": mal_id,
        "title": title,
        "title_japanese": null,
        "type": "TV",
        "rating": "PG-13 - Teens 13 or older",
        "score": 7.5,
        "images": { "jpg": { "image_url": format!("https://cdn.example/{}.jpg", mal_id) } },
        "genres": [ { "mal_id": 1, "type": "anime", "name": "Action" } ]
    })
}

pub fn entry_rated(mal_id: u32, title: &str, rating: &str) -> Value {
    let mut value = entry(mal_id, title);
    value["rating"] = json!(rating);
    value
}

/// Listing envelope with pagination
pub fn listing(entries: Vec<Value>, current_page: u32, has_next_page: bool, last_visible_page: u32) -> Value {
    json!({
        "pagination": {
            "current_page": current_page,
            "has_next_page": has_next_page,
            "last_visible_page": last_visible_page
        },
        "data": entries
    })
}

pub fn rate_limited() -> Value {
    json!({ "status": 429, "type": "RateLimitException", "message": "You are being rate limited by Jikan" })
}
