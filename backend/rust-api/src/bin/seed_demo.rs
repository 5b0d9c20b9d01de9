use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::fmt::init;

use learnpath_api::{
    config::Config,
    services::demo_seed::{seed_mongo, SeedOutcome},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::load().context("Failed to load configuration")?;

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let mongo = mongo_client.database(&config.mongo_database);

    match seed_mongo(&mongo, Utc::now()).await? {
        SeedOutcome::Inserted => tracing::info!(
            "Demo data seeded into database {}",
            config.mongo_database
        ),
        SeedOutcome::AlreadyPresent => tracing::info!("Demo data already present"),
    }

    Ok(())
}
