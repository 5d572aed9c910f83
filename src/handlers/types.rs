//! # Common API Types
//!
//! This module contains shared types used across multiple API handlers,
//! including the standard response envelope and pagination wrapper.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard API response envelope for management endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response metadata
    pub meta: ResponseMeta,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload with fresh response metadata
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::now(),
        }
    }
}

/// Response metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    /// Unique request identifier for tracing
    #[schema(example = "req-1a2b3c4d5e6f")]
    pub request_id: String,
    /// Response timestamp (ISO 8601)
    #[schema(example = "2025-06-10T10:30:00Z")]
    pub timestamp: String,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            request_id: crate::telemetry::current_trace_id()
                .unwrap_or_else(|| format!("req-{}", &uuid::Uuid::new_v4().simple().to_string()[..12])),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Generic paginated response wrapper for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// List of items for the current page
    pub data: Vec<T>,
    /// Opaque cursor for fetching the next page (null if this is the last page)
    pub next_cursor: Option<String>,
    /// Convenience field indicating if more pages exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response
    pub fn new(data: Vec<T>, next_cursor: Option<String>) -> Self {
        let has_more = next_cursor.is_some();
        Self {
            data,
            next_cursor,
            has_more: Some(has_more),
        }
    }
}
