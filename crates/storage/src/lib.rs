pub mod dto;
pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod services;
pub mod store;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use error::{Result, StorageError};
pub use memory::MemoryStore;
pub use repository::{MatchRequestRepository, OutboxRepository, TeamRepository};
pub use store::{MatchRequestStore, OutboxStore, TeamStore};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn teams(&self) -> TeamRepository {
        TeamRepository::new(self.pool.clone())
    }

    pub fn match_requests(&self) -> MatchRequestRepository {
        MatchRequestRepository::new(self.pool.clone())
    }

    pub fn outbox(&self) -> OutboxRepository {
        OutboxRepository::new(self.pool.clone())
    }
}
