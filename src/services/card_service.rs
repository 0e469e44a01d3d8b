use std::sync::Arc;

use crate::db::CardRepository;
use crate::error::{AppError, Result};
use crate::models::card::{CardRequest, CardResponse, CreateCardData, LastFourSearch};
use crate::services::encryption::PanCodec;
use crate::services::{masking, pan_validation};

/// Card use cases: create, search by PAN, search by last four digits.
///
/// Plaintext PANs only live for the duration of a call. They are never
/// stored and never logged.
pub struct CardService<R> {
    repository: R,
    codec: Arc<PanCodec>,
}

impl<R: CardRepository> CardService<R> {
    pub fn new(repository: R, codec: Arc<PanCodec>) -> Self {
        Self { repository, codec }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Validates and stores a new card.
    ///
    /// The response is masked from the PAN the caller supplied, so the happy
    /// path never decrypts.
    #[tracing::instrument(skip_all)]
    pub async fn create_card(&self, cardholder_name: &str, pan: &str) -> Result<CardResponse> {
        if cardholder_name.trim().is_empty() {
            return Err(AppError::Validation(
                "Cardholder name must not be blank".to_string(),
            ));
        }

        if !pan_validation::is_valid_pan(pan) {
            return Err(AppError::Validation("Invalid PAN".to_string()));
        }

        let data = CreateCardData {
            cardholder_name: cardholder_name.to_string(),
            encrypted_pan: self.codec.encrypt(pan)?,
            pan_hash: self.codec.generate_hash(pan)?,
            last_four_digits: masking::last_four_digits(pan),
        };

        let card = self.repository.save(data).await?;

        tracing::info!(
            card_id = %card.id,
            last_four = %card.last_four_digits,
            "Card created"
        );

        Ok(CardResponse::new(&card, masking::mask_pan(pan)))
    }

    /// Checks every field of a client request, then creates the card.
    pub async fn create_from_request(&self, request: &CardRequest) -> Result<CardResponse> {
        request.validate().map_err(AppError::Validation)?;

        self.create_card(&request.cardholder_name, &request.pan).await
    }

    /// Finds cards holding `pan` by comparing lookup hashes.
    ///
    /// Matches share the PAN by construction, so each response masks the
    /// supplied value instead of decrypting the stored one.
    #[tracing::instrument(skip_all)]
    pub async fn search_by_pan(&self, pan: &str) -> Result<Vec<CardResponse>> {
        if !pan_validation::has_pan_format(pan) {
            return Err(AppError::Validation("PAN must be 12-19 digits".to_string()));
        }

        let pan_hash = self.codec.generate_hash(pan)?;
        let cards = self.repository.find_by_pan_hash(&pan_hash).await?;

        let masked_pan = masking::mask_pan(pan);
        let responses: Vec<CardResponse> = cards
            .iter()
            .map(|card| CardResponse::new(card, masked_pan.clone()))
            .collect();

        tracing::info!(count = responses.len(), "PAN search completed");

        Ok(responses)
    }

    /// Finds cards by their stored last four digits, decrypting each match.
    ///
    /// A record that fails to decrypt (corrupt, or written under another
    /// secret) is reported in [`LastFourSearch::undecryptable`] and does not
    /// fail the search.
    #[tracing::instrument(skip(self))]
    pub async fn search_by_last_four_digits(
        &self,
        last_four_digits: &str,
    ) -> Result<LastFourSearch> {
        if last_four_digits.len() != 4 || !last_four_digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::Validation(
                "Last four digits must be exactly 4 digits".to_string(),
            ));
        }

        let cards = self
            .repository
            .find_by_last_four_digits(last_four_digits)
            .await?;

        let mut search = LastFourSearch::default();
        for card in &cards {
            match self.codec.decrypt(card.encrypted_pan.as_str()) {
                Ok(pan) => search
                    .cards
                    .push(CardResponse::new(card, masking::mask_pan(pan.as_str()))),
                Err(e) => {
                    tracing::warn!(
                        card_id = %card.id,
                        error = %e,
                        "Skipping card whose PAN could not be decrypted"
                    );
                    search.undecryptable.push(card.id);
                }
            }
        }

        tracing::info!(
            count = search.cards.len(),
            undecryptable = search.undecryptable.len(),
            "Last four search completed"
        );

        Ok(search)
    }
}
