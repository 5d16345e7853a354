use std::sync::Arc;

use crate::config::Settings;
use crate::connection_manager::ConnectionManager;
use crate::dispatch::MessageDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub connections: Arc<ConnectionManager>,
    pub dispatcher: Arc<MessageDispatcher>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let connections = Arc::new(ConnectionManager::with_cleanup(
            settings.websocket.cleanup_subscriptions_on_close,
        ));
        let dispatcher = Arc::new(MessageDispatcher::from_manager(&connections));

        Self {
            settings: Arc::new(settings),
            connections,
            dispatcher,
        }
    }
}
