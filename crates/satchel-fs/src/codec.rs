use std::fmt;
use std::path::Path;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use rand::RngCore;
use satchel_core::adapter::AdapterError;
use satchel_core::record::Record;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const NONCE_LEN: usize = 12;

/// 256-bit key material for encryption at rest, configured as base64.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey([u8; 32]);

impl CipherKey {
    /// Parse key material from its base64 form. Rejects anything other
    /// than exactly 32 bytes once decoded.
    pub fn from_base64(encoded: &str) -> Result<Self, AdapterError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AdapterError::InvalidCipherKey {
                reason: e.to_string(),
            })?;

        if bytes.len() != 32 {
            return Err(AdapterError::InvalidCipherKey {
                reason: format!("expected 32 bytes, got {}", bytes.len()),
            });
        }

        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    /// Generate fresh random key material.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Render the key in the form `from_base64` accepts.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey(..)")
    }
}

/// On-disk wrapper for an encrypted record file.
#[derive(Debug, Serialize, Deserialize)]
struct SealedRecord {
    nonce: String,
    ciphertext: String,
}

/// Turns records into file bytes and back, encrypting when key material
/// is configured. Encrypted files hold a `SealedRecord` envelope with a
/// fresh nonce per write; plaintext files hold the record JSON as-is.
pub struct Codec {
    cipher: Option<Aes256Gcm>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("encrypted", &self.cipher.is_some())
            .finish()
    }
}

impl Codec {
    pub fn new(key: Option<CipherKey>) -> Self {
        let cipher = key
            .as_ref()
            .map(|key| Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0)));
        Self { cipher }
    }

    /// Serialize a record into the bytes written to its file.
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>, AdapterError> {
        let plain = serde_json::to_vec(record).map_err(storage_err)?;

        let cipher = match &self.cipher {
            Some(cipher) => cipher,
            None => return Ok(plain),
        };

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plain.as_slice())
            .map_err(|e| AdapterError::Storage {
                reason: format!("encrypt failed: {e}"),
            })?;

        let sealed = SealedRecord {
            nonce: URL_SAFE_NO_PAD.encode(nonce.as_slice()),
            ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
        };
        serde_json::to_vec(&sealed).map_err(storage_err)
    }

    /// Parse file bytes back into a record. `path` labels any error.
    pub fn decode(&self, bytes: &[u8], path: &Path) -> Result<Record, AdapterError> {
        let cipher = match &self.cipher {
            Some(cipher) => cipher,
            None => return parse_json(bytes, path),
        };

        let sealed: SealedRecord = parse_json(bytes, path)?;
        let nonce = decode_field(&sealed.nonce, "nonce", path)?;
        if nonce.len() != NONCE_LEN {
            return Err(AdapterError::Parse {
                path: label(path),
                reason: format!("nonce must be {NONCE_LEN} bytes, got {}", nonce.len()),
            });
        }
        let ciphertext = decode_field(&sealed.ciphertext, "ciphertext", path)?;

        let plain = cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|_| AdapterError::Decrypt { path: label(path) })?;
        parse_json(&plain, path)
    }
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8], path: &Path) -> Result<T, AdapterError> {
    serde_json::from_slice(bytes).map_err(|e| AdapterError::Parse {
        path: label(path),
        reason: e.to_string(),
    })
}

fn decode_field(encoded: &str, field: &str, path: &Path) -> Result<Vec<u8>, AdapterError> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| AdapterError::Parse {
            path: label(path),
            reason: format!("{field} decode failed: {e}"),
        })
}

fn label(path: &Path) -> String {
    path.display().to_string()
}

fn storage_err<E: ToString>(err: E) -> AdapterError {
    AdapterError::Storage {
        reason: err.to_string(),
    }
}
