//! Application state for the HTTP server.

use std::sync::Arc;

use crate::auth::TokenService;
use crate::db::repository::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Token issue/validation service
    pub tokens: TokenService,
}

impl AppState {
    /// Create a new application state.
    pub fn new(repository: Arc<dyn FullRepository>, tokens: TokenService) -> Self {
        Self { repository, tokens }
    }
}
