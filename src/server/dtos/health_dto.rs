use chrono::{DateTime, Utc};
use serde::Serialize;

// nothing to check downstream, sources are fetched per request and never cached
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub version: String,
    pub environment: String,
}
