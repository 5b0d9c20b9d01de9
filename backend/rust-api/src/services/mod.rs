use std::sync::Arc;

use crate::config::Config;
use learning_store::{LearningStore, MongoLearningStore};
use mongodb::Client as MongoClient;

pub mod attempt_service;
pub mod catalog_service;
pub mod demo_seed;
pub mod learning_store;
pub mod overview_service;
pub mod recommender;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn LearningStore>,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);
        let store = MongoLearningStore::new(mongo);

        tracing::info!("Checking MongoDB connectivity...");

        tokio::time::timeout(std::time::Duration::from_secs(10), store.ping())
            .await
            .map_err(|_| anyhow::anyhow!("MongoDB ping timeout after 10s"))??;

        tracing::info!("MongoDB connection established successfully");

        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: Config, store: Arc<dyn LearningStore>) -> Self {
        Self { config, store }
    }
}
