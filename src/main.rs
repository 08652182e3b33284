use std::sync::Arc;

use rollbook::config::Config;
use rollbook::store::{MemoryStore, PgStore, SharedStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = Config::from_env()?;

    let store: SharedStore = match &config.database_url {
        Some(url) => {
            log::info!("Connecting to PostgreSQL ({} connections)", config.max_connections);
            Arc::new(PgStore::connect(url, config.max_connections).await?)
        }
        None => {
            log::warn!("DATABASE_URL is not set, records are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let app = rollbook::app(store);
    log::info!("Starting Rollbook HTTP Server on http://{}", config.bind);
    axum::Server::bind(&config.bind)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
