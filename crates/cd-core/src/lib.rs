//! Shared primitives used across ChalkDust crates.

use core::fmt;

/// Result alias used across the workspace.
pub type PageResult<T> = Result<T, PageError>;

/// Error raised while wiring a page or validating its configuration.
///
/// Codes are dotted `area.detail` strings, stable across releases so an
/// embedder can match on them without parsing the human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageError {
    pub code: &'static str,
    pub message: String,
}

impl PageError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A required element the page markup does not carry.
    pub fn missing_element(code: &'static str, id: &str) -> Self {
        Self::new(code, format!("required element #{id} not found"))
    }

    /// The code's leading area: `page` for `page.navbar_missing`.
    pub fn area(&self) -> &'static str {
        self.code.split('.').next().unwrap_or(self.code)
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PageError {}
