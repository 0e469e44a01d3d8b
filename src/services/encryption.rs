//! Deterministic PAN encryption and keyed lookup hashing.
//!
//! All key material is derived from one configured secret with
//! PBKDF2-HMAC-SHA256 over a fixed salt, split into three independent keys:
//! the AES-256-GCM key, the synthetic-nonce key and the lookup-hash key.
//!
//! Ciphertext format (base64, standard alphabet):
//!
//! ```text
//! [nonce (12 bytes)][ciphertext][auth tag (16 bytes)]
//! ```
//!
//! The nonce is `HMAC-SHA256(nonce_key, plaintext)` truncated to 12 bytes, so
//! the same plaintext under the same secret always encrypts to the same
//! value. Known limitations:
//!
//! - Identical PANs produce identical ciphertexts, so ciphertext equality
//!   reveals PAN equality. Lookup by hash depends on this property.
//! - The KDF salt is a hard-coded constant. There is no per-record or
//!   per-deployment randomness in key derivation.

use std::fmt;
use std::num::NonZeroU32;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::aead::{
    Aad, BoundKey, Nonce, NonceSequence, OpeningKey, SealingKey, UnboundKey, AES_256_GCM,
    NONCE_LEN,
};
use ring::error::Unspecified;
use ring::{hmac, pbkdf2};
use secrecy::zeroize::Zeroize;
use secrecy::{ExposeSecret, Secret};

/// Minimum accepted length of the configured secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

const KDF_SALT: &[u8] = b"cardvault/pan-codec/v1";
const KDF_ITERATIONS: NonZeroU32 = match NonZeroU32::new(10_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

#[derive(thiserror::Error, Debug)]
pub enum EncryptionError {
    #[error("Missing required input: {0}")]
    InvalidInput(&'static str),

    #[error("Decoding failed: {0}")]
    Decoding(&'static str),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Secret too short (expected at least 32 bytes)")]
    WeakSecret,
}

impl From<Unspecified> for EncryptionError {
    fn from(_: Unspecified) -> Self {
        EncryptionError::EncryptionFailed("Cryptographic operation failed".to_string())
    }
}

/// Hands out a single precomputed nonce.
struct SyntheticNonce {
    nonce: [u8; NONCE_LEN],
}

impl SyntheticNonce {
    fn new(nonce: [u8; NONCE_LEN]) -> Self {
        Self { nonce }
    }
}

impl NonceSequence for SyntheticNonce {
    fn advance(&mut self) -> Result<Nonce, Unspecified> {
        Nonce::try_assume_unique_for_key(&self.nonce)
    }
}

/// Encrypts, decrypts and hashes PANs under keys derived from one secret.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct PanCodec {
    cipher_key: Secret<[u8; KEY_LEN]>,
    nonce_key: hmac::Key,
    hash_key: hmac::Key,
}

impl PanCodec {
    /// Derives all key material from `secret`.
    ///
    /// Fails with [`EncryptionError::WeakSecret`] if the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &Secret<String>) -> Result<Self, EncryptionError> {
        let secret = secret.expose_secret();
        if secret.len() < MIN_SECRET_LEN {
            return Err(EncryptionError::WeakSecret);
        }

        let mut okm = [0u8; 3 * KEY_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            KDF_ITERATIONS,
            KDF_SALT,
            secret.as_bytes(),
            &mut okm,
        );

        let mut cipher_key = [0u8; KEY_LEN];
        cipher_key.copy_from_slice(&okm[..KEY_LEN]);
        let nonce_key = hmac::Key::new(hmac::HMAC_SHA256, &okm[KEY_LEN..2 * KEY_LEN]);
        let hash_key = hmac::Key::new(hmac::HMAC_SHA256, &okm[2 * KEY_LEN..]);

        let codec = Self {
            cipher_key: Secret::new(cipher_key),
            nonce_key,
            hash_key,
        };

        cipher_key.zeroize();
        okm.zeroize();

        Ok(codec)
    }

    /// Encrypts `plaintext` and returns the base64 encoded result.
    ///
    /// The empty string is a valid plaintext; an absent one is not.
    pub fn encrypt<'a>(
        &self,
        plaintext: impl Into<Option<&'a str>>,
    ) -> Result<String, EncryptionError> {
        let plaintext = plaintext
            .into()
            .ok_or(EncryptionError::InvalidInput("plaintext"))?;

        let nonce_bytes = self.synthetic_nonce(plaintext.as_bytes());

        let unbound_key = UnboundKey::new(&AES_256_GCM, self.cipher_key.expose_secret())?;
        let mut sealing_key = SealingKey::new(unbound_key, SyntheticNonce::new(nonce_bytes));

        let mut in_out = plaintext.as_bytes().to_vec();
        sealing_key
            .seal_in_place_append_tag(Aad::empty(), &mut in_out)
            .map_err(|_| EncryptionError::EncryptionFailed("Sealing failed".to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&in_out);

        Ok(STANDARD.encode(blob))
    }

    /// Decrypts a value produced by [`PanCodec::encrypt`] under the same secret.
    pub fn decrypt<'a>(
        &self,
        ciphertext: impl Into<Option<&'a str>>,
    ) -> Result<String, EncryptionError> {
        let encoded = ciphertext
            .into()
            .ok_or(EncryptionError::InvalidInput("ciphertext"))?;

        let blob = STANDARD
            .decode(encoded)
            .map_err(|_| EncryptionError::Decoding("ciphertext is not valid base64"))?;

        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(EncryptionError::Decoding("ciphertext is too short"));
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        nonce_bytes.copy_from_slice(&blob[..NONCE_LEN]);

        let unbound_key = UnboundKey::new(&AES_256_GCM, self.cipher_key.expose_secret())?;
        let mut opening_key = OpeningKey::new(unbound_key, SyntheticNonce::new(nonce_bytes));

        let mut in_out = blob[NONCE_LEN..].to_vec();
        let decrypted = opening_key
            .open_in_place(Aad::empty(), &mut in_out)
            .map_err(|_| EncryptionError::Decoding("authentication failed"))?;

        if self.synthetic_nonce(decrypted) != nonce_bytes {
            return Err(EncryptionError::Decoding("nonce does not match plaintext"));
        }

        String::from_utf8(decrypted.to_vec())
            .map_err(|_| EncryptionError::Decoding("plaintext is not valid UTF-8"))
    }

    /// Keyed one-way digest of `pan`, hex encoded (64 characters).
    ///
    /// Used as the lookup key for stored cards.
    pub fn generate_hash<'a>(
        &self,
        pan: impl Into<Option<&'a str>>,
    ) -> Result<String, EncryptionError> {
        let pan = pan.into().ok_or(EncryptionError::InvalidInput("pan"))?;
        let tag = hmac::sign(&self.hash_key, pan.as_bytes());

        Ok(hex::encode(tag.as_ref()))
    }

    fn synthetic_nonce(&self, plaintext: &[u8]) -> [u8; NONCE_LEN] {
        let tag = hmac::sign(&self.nonce_key, plaintext);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&tag.as_ref()[..NONCE_LEN]);
        nonce
    }
}

impl fmt::Debug for PanCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanCodec").finish_non_exhaustive()
    }
}
