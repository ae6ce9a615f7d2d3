//! Application State

use engine::Warehouse;

/// Application state shared by every handler
pub struct AppState {
    /// Catalog and job ledger
    pub warehouse: Warehouse,

    /// Discovery document, already pointed at this server
    pub discovery: Option<String>,
}

impl AppState {
    /// Create a new application state
    pub fn new() -> Self {
        Self {
            warehouse: Warehouse::new(),
            discovery: None,
        }
    }

    /// Serve `document` at the discovery endpoint
    pub fn with_discovery(mut self, document: String) -> Self {
        self.discovery = Some(document);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
