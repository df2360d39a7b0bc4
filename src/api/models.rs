//! API models for the batch fetch endpoint.
//!
//! `POST /fetch` takes a bare JSON array of URLs:
//!
//! ```json
//! ["https://example.com", "https://example.org/about"]
//! ```
//!
//! and answers with one [`FetchResult`](crate::engine::FetchResult) per URL,
//! in completion order. See [`crate::engine::models`] for the result shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::observability::MetricsSnapshot;

/// Decoded body of `POST /fetch`
pub type BatchRequest = Vec<String>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub workers: usize,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub workers: usize,
}
