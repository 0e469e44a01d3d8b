use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::CardRepository;
use crate::error::Result;
use crate::models::card::{Card, CreateCardData};

/// Process-local card store, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryCardRepository {
    cards: RwLock<Vec<Card>>,
}

impl MemoryCardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }

    /// Stores a fully formed record as-is, e.g. one written under another secret.
    pub async fn insert_raw(&self, card: Card) {
        self.cards.write().await.push(card);
    }
}

#[async_trait]
impl CardRepository for MemoryCardRepository {
    async fn save(&self, data: CreateCardData) -> Result<Card> {
        let card = Card {
            id: Uuid::new_v4(),
            cardholder_name: data.cardholder_name,
            encrypted_pan: data.encrypted_pan,
            pan_hash: data.pan_hash,
            last_four_digits: data.last_four_digits,
            created_at: Utc::now(),
        };

        self.cards.write().await.push(card.clone());

        Ok(card)
    }

    async fn find_by_pan_hash(&self, pan_hash: &str) -> Result<Vec<Card>> {
        let cards = self.cards.read().await;

        Ok(cards
            .iter()
            .filter(|card| card.pan_hash == pan_hash)
            .cloned()
            .collect())
    }

    async fn find_by_last_four_digits(&self, last_four_digits: &str) -> Result<Vec<Card>> {
        let cards = self.cards.read().await;

        Ok(cards
            .iter()
            .filter(|card| card.last_four_digits == last_four_digits)
            .cloned()
            .collect())
    }
}
