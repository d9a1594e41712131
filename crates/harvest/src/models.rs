// ABOUTME: Value types produced by the harvester: Review records and AppInfo metadata.
// ABOUTME: Both are built fresh per request and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Fallback app name when no heading can be found on the landing page.
pub const UNKNOWN_APP: &str = "Unknown App";

/// Fallback developer name when no developer markup can be found.
pub const UNKNOWN_DEVELOPER: &str = "Unknown Developer";

/// One normalized user review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub author: String,
    pub text: String,
    pub rating: u8,
    /// Canonical `YYYY-MM-DD`.
    pub date: String,
}

/// Listing metadata scraped from the app landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub developer: String,
    pub rating: Option<f64>,
    #[serde(rename = "ratingCount")]
    pub rating_count: Option<u64>,
}

impl AppInfo {
    /// True when every field fell back to its default.
    pub fn is_empty(&self) -> bool {
        self.name == UNKNOWN_APP
            && self.developer == UNKNOWN_DEVELOPER
            && self.rating.is_none()
            && self.rating_count.is_none()
    }
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: UNKNOWN_APP.to_string(),
            developer: UNKNOWN_DEVELOPER.to_string(),
            rating: None,
            rating_count: None,
        }
    }
}
