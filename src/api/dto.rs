//! Shared API Types
//!
//! The backend wraps every response in a `{success, data, message}`
//! envelope; list endpoints additionally page their results.

use serde::Deserialize;

/// Standard response envelope
///
/// `success` defaults to true so a plain body behind a proxy still
/// decodes; the HTTP status has already been checked at that point.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_true")]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Paginated list payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    #[serde(default)]
    pub last: bool,
}
