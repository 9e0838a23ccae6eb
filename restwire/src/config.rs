//! Server configuration - server-wide static settings.
//!
//! Set once at startup and shared with every [`Session`](crate::Session)
//! through [`RestLayer`](crate::RestLayer).

use restwire_core::JsonStyle;

/// Server-wide configuration.
///
/// # Example
///
/// ```rust
/// use restwire::ServerConfig;
///
/// let config = ServerConfig::new()
///     .json_indent("", "  ")
///     .body_limit(1024 * 1024);
/// assert!(!config.json_style().is_compact());
/// assert_eq!(config.get_body_limit(), Some(1024 * 1024));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    json: JsonStyle,
    body_limit: Option<usize>,
}

impl ServerConfig {
    /// Compact JSON, no body limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-print JSON replies with `prefix` and `indent`.
    pub fn json_indent<P: Into<String>, I: Into<String>>(mut self, prefix: P, indent: I) -> Self {
        self.json = JsonStyle::indented(prefix, indent);
        self
    }

    /// Reject request bodies larger than `limit` bytes when decoding.
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    pub fn json_style(&self) -> &JsonStyle {
        &self.json
    }

    pub fn get_body_limit(&self) -> Option<usize> {
        self.body_limit
    }
}
