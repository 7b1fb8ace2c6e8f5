use std::sync::Arc;

use crate::auth::TokenManager;
use crate::config::Config;
use crate::notifications::{Mailer, Notifier};
use crate::store::EventStore;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub tokens: Arc<TokenManager>,
    pub notifier: Notifier,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn EventStore>, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenManager::new(&config.jwt_secret, config.token_ttl());
        let notifier = Notifier::new(store.clone(), mailer, config.from_email.clone());

        Self {
            store,
            tokens: Arc::new(tokens),
            notifier,
            config: Arc::new(config),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }
}
