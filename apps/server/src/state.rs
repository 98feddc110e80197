//! Shared application state.

use std::sync::Arc;

use apotek_db::Database;

use crate::config::ServerConfig;
use crate::notify::WhatsAppSender;

/// State handed to every handler. Cheap to clone: the pool is an Arc
/// internally and the sender is one explicitly.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sender: Arc<dyn WhatsAppSender>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, sender: Arc<dyn WhatsAppSender>, config: ServerConfig) -> Self {
        AppState {
            db,
            sender,
            config: Arc::new(config),
        }
    }
}
