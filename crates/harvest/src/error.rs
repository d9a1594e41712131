// ABOUTME: Error types for the harvester including ErrorCode enum and ScrapeError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the failure categories that reach the caller.
///
/// Extraction problems never show up here: an exhausted block chain is an empty
/// sequence, an unrecoverable field falls back to its default, and a rejected
/// block is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidAppId,
    InvalidUrl,
    Fetch,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidAppId => "invalid package identifier",
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Fetch => "fetch error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for harvest operations.
#[derive(Debug, thiserror::Error)]
pub struct ScrapeError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playreviews: {}", self.op)?;
        if !self.url.is_empty() {
            write!(f, " {}", self.url)?;
        }
        write!(f, ": {}", self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl ScrapeError {
    /// Create an InvalidAppId error. There is no URL yet at this point.
    pub fn invalid_app_id(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: ErrorCode::InvalidAppId,
            url: String::new(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::InvalidUrl,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::Fetch,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match (self.code, self.op.as_str()) {
            (ErrorCode::InvalidAppId, _) => "Please enter a package name!",
            (ErrorCode::InvalidUrl, _) => "Invalid listing URL",
            (ErrorCode::Fetch, "AppInfo") => "Failed to fetch app information",
            (ErrorCode::Fetch, _) => "Failed to fetch reviews",
        }
    }

    /// Returns true if this is an InvalidAppId error.
    pub fn is_invalid_app_id(&self) -> bool {
        self.code == ErrorCode::InvalidAppId
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }
}
