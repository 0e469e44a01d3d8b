use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::services::pan_validation;

/// A stored card. The PAN only exists here as ciphertext and lookup hash.
#[derive(Debug, Clone, FromRow)]
pub struct Card {
    pub id: Uuid,
    pub cardholder_name: String,
    pub encrypted_pan: String,
    pub pan_hash: String,
    pub last_four_digits: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCardData {
    pub cardholder_name: String,
    pub encrypted_pan: String,
    pub pan_hash: String,
    pub last_four_digits: String,
}

impl Card {
    /// Inserts a new card; the database assigns `id` and `created_at`.
    pub async fn create(pool: &PgPool, data: CreateCardData) -> Result<Self, sqlx::Error> {
        let card = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO cards (cardholder_name, encrypted_pan, pan_hash, last_four_digits)
            VALUES ($1, $2, $3, $4)
            RETURNING id, cardholder_name, encrypted_pan, pan_hash, last_four_digits, created_at
            "#,
        )
        .bind(&data.cardholder_name)
        .bind(&data.encrypted_pan)
        .bind(&data.pan_hash)
        .bind(&data.last_four_digits)
        .fetch_one(pool)
        .await?;

        Ok(card)
    }

    /// Finds every card whose PAN hashes to `pan_hash`
    pub async fn find_by_pan_hash(pool: &PgPool, pan_hash: &str) -> Result<Vec<Self>, sqlx::Error> {
        let cards = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, cardholder_name, encrypted_pan, pan_hash, last_four_digits, created_at
            FROM cards
            WHERE pan_hash = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(pan_hash)
        .fetch_all(pool)
        .await?;

        Ok(cards)
    }

    /// Finds every card ending in `last_four_digits`
    pub async fn find_by_last_four_digits(
        pool: &PgPool,
        last_four_digits: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let cards = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, cardholder_name, encrypted_pan, pan_hash, last_four_digits, created_at
            FROM cards
            WHERE last_four_digits = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(last_four_digits)
        .fetch_all(pool)
        .await?;

        Ok(cards)
    }
}

/// Caller-facing view of a card. Never carries the ciphertext, hash or full PAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub id: Uuid,
    pub cardholder_name: String,
    pub masked_pan: String,
    pub created_at: DateTime<Utc>,
}

impl CardResponse {
    pub fn new(card: &Card, masked_pan: String) -> Self {
        Self {
            id: card.id,
            cardholder_name: card.cardholder_name.clone(),
            masked_pan,
            created_at: card.created_at,
        }
    }
}

/// Result of a last-four search.
///
/// Records whose ciphertext could not be decrypted are listed by id in
/// `undecryptable` instead of failing the whole search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastFourSearch {
    pub cards: Vec<CardResponse>,
    pub undecryptable: Vec<Uuid>,
}

impl LastFourSearch {
    pub fn is_complete(&self) -> bool {
        self.undecryptable.is_empty()
    }
}

/// Card creation request as received from a client.
///
/// Expiry date and CVV are format-checked only. They are never stored.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    pub cardholder_name: String,
    pub pan: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl CardRequest {
    /// Checks field formats, returning the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.cardholder_name.trim().is_empty() {
            return Err("Cardholder name must not be blank".to_string());
        }

        if !pan_validation::has_pan_format(&self.pan) {
            return Err("PAN must be 12-19 digits".to_string());
        }

        if !is_valid_expiry(&self.expiry_date) {
            return Err("Expiry date must be in MM/YY format".to_string());
        }

        if !((3..=4).contains(&self.cvv.len()) && is_all_digits(&self.cvv)) {
            return Err("CVV must be 3-4 digits".to_string());
        }

        Ok(())
    }
}

// Hand-written so the PAN and CVV never reach logs
impl std::fmt::Debug for CardRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardRequest")
            .field("cardholder_name", &self.cardholder_name)
            .field("pan", &"<redacted>")
            .field("expiry_date", &self.expiry_date)
            .field("cvv", &"<redacted>")
            .finish()
    }
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };

    if month.len() != 2 || year.len() != 2 || !is_all_digits(month) || !is_all_digits(year) {
        return false;
    }

    matches!(month.parse::<u8>(), Ok(1..=12))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CardRequest {
        CardRequest {
            cardholder_name: "Alice".to_string(),
            pan: "4111111111111111".to_string(),
            expiry_date: "12/29".to_string(),
            cvv: "123".to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let req = CardRequest {
            cardholder_name: "   ".to_string(),
            ..request()
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_pan_format_rejected() {
        for pan in ["41111111111", "4111-1111-1111-1111", ""] {
            let req = CardRequest {
                pan: pan.to_string(),
                ..request()
            };
            assert_eq!(req.validate(), Err("PAN must be 12-19 digits".to_string()));
        }
    }

    #[test]
    fn test_expiry_format() {
        assert!(is_valid_expiry("01/25"));
        assert!(is_valid_expiry("12/99"));
        assert!(!is_valid_expiry("00/25"));
        assert!(!is_valid_expiry("13/25"));
        assert!(!is_valid_expiry("1/25"));
        assert!(!is_valid_expiry("01/2025"));
        assert!(!is_valid_expiry("0125"));
        assert!(!is_valid_expiry("ab/cd"));
    }

    #[test]
    fn test_cvv_format() {
        for (cvv, ok) in [("123", true), ("1234", true), ("12", false), ("12345", false), ("12a", false)] {
            let req = CardRequest {
                cvv: cvv.to_string(),
                ..request()
            };
            assert_eq!(req.validate().is_ok(), ok, "cvv {}", cvv);
        }
    }

    #[test]
    fn test_request_debug_redacts_secrets() {
        let rendered = format!("{:?}", request());

        assert!(!rendered.contains("4111111111111111"));
        assert!(!rendered.contains("123\""));
        assert!(rendered.contains("Alice"));
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let req: CardRequest = serde_json::from_str(
            r#"{"cardholderName":"Bob","pan":"5555555555554444","expiryDate":"01/30","cvv":"999"}"#,
        )
        .unwrap();

        assert_eq!(req.cardholder_name, "Bob");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_last_four_search_completeness() {
        let mut search = LastFourSearch::default();
        assert!(search.is_complete());

        search.undecryptable.push(Uuid::new_v4());
        assert!(!search.is_complete());
    }
}
