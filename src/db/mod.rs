use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::error::Result;
use crate::models::card::{Card, CreateCardData};

pub mod memory;

pub use memory::MemoryCardRepository;

/// Builds the Postgres pool backing [`PgCardRepository`].
///
/// The `cards` table must already exist; this crate ships no migrations.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Persistence for card records. Cards are only ever appended and read.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Stores a new card and returns it with its assigned id and timestamp.
    async fn save(&self, data: CreateCardData) -> Result<Card>;

    async fn find_by_pan_hash(&self, pan_hash: &str) -> Result<Vec<Card>>;

    async fn find_by_last_four_digits(&self, last_four_digits: &str) -> Result<Vec<Card>>;
}

#[derive(Debug, Clone)]
pub struct PgCardRepository {
    pool: PgPool,
}

impl PgCardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardRepository for PgCardRepository {
    async fn save(&self, data: CreateCardData) -> Result<Card> {
        Ok(Card::create(&self.pool, data).await?)
    }

    async fn find_by_pan_hash(&self, pan_hash: &str) -> Result<Vec<Card>> {
        Ok(Card::find_by_pan_hash(&self.pool, pan_hash).await?)
    }

    async fn find_by_last_four_digits(&self, last_four_digits: &str) -> Result<Vec<Card>> {
        Ok(Card::find_by_last_four_digits(&self.pool, last_four_digits).await?)
    }
}
