//! Configuration for the adoption module.

use serde::{Deserialize, Serialize};

/// Configuration for the adoption module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AdoptionConfig {
    /// Enforce "one pending application per adopter/breeder pair" atomically in
    /// the ledger. When disabled, a query-before-write check is used and
    /// concurrent submissions may both succeed.
    pub enforce_unique_pending: bool,

    /// Page size used when a list request carries no limit.
    pub default_page_size: usize,

    /// Upper bound applied to any requested page size.
    pub max_page_size: usize,

    /// Maximum length of free-text inputs (notes, reasons, review content).
    pub max_text_length: usize,

    /// Number of entries returned by the recent admin activity view.
    pub recent_activity_limit: usize,
}

impl Default for AdoptionConfig {
    fn default() -> Self {
        Self {
            enforce_unique_pending: true,
            default_page_size: 20,
            max_page_size: 100,
            max_text_length: 2000,
            recent_activity_limit: 10,
        }
    }
}

impl AdoptionConfig {
    /// Resolves a requested page size against the configured bounds.
    #[must_use]
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}
