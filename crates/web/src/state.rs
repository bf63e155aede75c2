use std::sync::Arc;

use gateway::{ContactRelay, IdentityProvider, Notifier, PhotoStorage};
use storage::{MatchRequestStore, TeamStore};

use crate::dispatcher::OutboxDispatcher;

/// Shared handles for every request handler.
#[derive(Clone)]
pub struct AppState {
    pub teams: Arc<dyn TeamStore>,
    pub match_requests: Arc<dyn MatchRequestStore>,
    pub dispatcher: OutboxDispatcher,
    /// Direct sender, used only when a request could not be recorded.
    pub notifier: Arc<dyn Notifier>,
    pub identity: Arc<dyn IdentityProvider>,
    pub photos: Arc<dyn PhotoStorage>,
    pub contact: Arc<dyn ContactRelay>,
    /// Public address of the front end, used in text messages.
    pub app_url: String,
}
