use crate::crypto::aead::{fill_random, AeadImpl};
use crate::error::{Error, Result};
use crate::Aead;
use aes_gcm::{
    aead::{Aead as AeadTrait, KeyInit},
    Aes256Gcm, Key as AesKey, Nonce,
};

use super::aead::{GCM_MAX_DATA_SIZE, GCM_NONCE_SIZE, GCM_TAG_SIZE};

/// AES-256-GCM implementation of AEAD
#[derive(Default, Debug, Clone)]
pub struct Aes256GcmAead;

impl Aes256GcmAead {
    /// Creates a new instance of the AES-256-GCM AEAD implementation
    pub fn new() -> Self {
        Self
    }
}

impl AeadImpl for Aes256GcmAead {
    fn encrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        if data.len() > GCM_MAX_DATA_SIZE {
            return Err(Error::Crypto("Data too large for GCM".into()));
        }

        // Convert the key to AES format
        let cipher_key = AesKey::<Aes256Gcm>::from_slice(key);

        // Create the cipher
        let cipher = Aes256Gcm::new(cipher_key);

        // Calculate the output size: ciphertext || tag || nonce
        let size = data.len() + GCM_TAG_SIZE + GCM_NONCE_SIZE;

        let mut nonce_bytes = [0_u8; GCM_NONCE_SIZE];
        fill_random(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // Encrypt the data
        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(&ciphertext); // ciphertext || tag
        out.extend_from_slice(&nonce_bytes); // || nonce

        Ok(out)
    }

    fn decrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        if data.len() < GCM_NONCE_SIZE + GCM_TAG_SIZE {
            // Must have at least nonce and tag
            return Err(Error::Crypto(
                "Data length is too short for GCM (nonce + tag)".into(),
            ));
        }

        // Convert the key to AES format
        let cipher_key = AesKey::<Aes256Gcm>::from_slice(key);

        // Create the cipher
        let cipher = Aes256Gcm::new(cipher_key);

        // Layout is ciphertext || tag || nonce; nonce is the trailing 12 bytes
        let split = data.len() - GCM_NONCE_SIZE;
        let nonce = Nonce::from_slice(&data[split..]);

        // Decrypt the data
        let plaintext = cipher
            .decrypt(nonce, &data[..split])
            .map_err(|e| Error::Crypto(format!("Decryption failed: {}", e)))?;

        Ok(plaintext)
    }
}

impl Aead for Aes256GcmAead {
    fn encrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        AeadImpl::encrypt(self, data, key)
    }

    fn decrypt(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        AeadImpl::decrypt(self, data, key)
    }
}
