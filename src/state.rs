use crate::auth::{self, Sessions};
use crate::config::Config;
use crate::defaults::default_collections;
use crate::storage::Store;
use std::{sync::Arc, time::Instant};
use tokio::fs;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<Store>,
    pub sessions: Arc<Sessions>,
    pub started_at: Instant,
}

impl AppState {
    /// Prepares directories, seeds missing collections and the admin account.
    pub async fn open(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        fs::create_dir_all(&config.upload_dir).await?;

        let store = Store::open(&config.data_dir, &default_collections()).await?;
        auth::ensure_admin(&store, &config.admin_username, &config.admin_password).await?;

        Ok(Self {
            sessions: Arc::new(Sessions::new(config.session_ttl)),
            config: Arc::new(config),
            store: Arc::new(store),
            started_at: Instant::now(),
        })
    }
}
