//! API request and response models

use serde::{Deserialize, Serialize};

/// Result string carried by success envelopes
pub const RESULT_OK: &str = "ok";

/// Success response wrapper: `{data, result: "ok", message: ""}`
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub result: String,
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            result: RESULT_OK.to_string(),
            message: String::new(),
        }
    }
}

/// Failure response wrapper: `{result, message}`
#[derive(Debug, Serialize, Deserialize)]
pub struct FailureEnvelope {
    pub result: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Payload of a bulk delete
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedCount {
    pub deleted: usize,
}
