//! Ledger configuration.

use serde::Deserialize;

/// Identity used for authority-gated ledger calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub authority: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            authority: "settlement-authority".into(),
        }
    }
}
