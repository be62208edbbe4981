//! Authenticated encryption of entry payloads.
//!
//! An encrypted payload is framed as `nonce (12) || ciphertext || tag (16)`
//! using AES-256-GCM. The entry's path, original length and compression
//! byte are bound in as associated data, so editing any of those table of
//! contents fields makes decryption fail instead of yielding wrong bytes.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use tracing::instrument;

use crate::compression::CompressionMethod;
use crate::error::{IntegrityError, Result};
use crate::key::ArchiveKey;
use crate::types::{NONCE_SIZE, TAG_SIZE};

/// Associated data for an entry: `UTF8(path) || u64 LE (original) || u8 (compression)`
///
/// Both the writer and the reader go through this function.
pub fn associated_data(path: &str, original: u64, compression: CompressionMethod) -> Vec<u8> {
    let mut aad = Vec::with_capacity(path.len() + 9);
    aad.extend_from_slice(path.as_bytes());
    aad.extend_from_slice(&original.to_le_bytes());
    aad.push(compression.as_byte());
    aad
}

/// Size of the sealed form of a `plaintext_len` byte payload
pub const fn sealed_size(plaintext_len: u64) -> u64 {
    NONCE_SIZE as u64 + plaintext_len + TAG_SIZE as u64
}

fn cipher(key: &ArchiveKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt `plaintext` under a fresh random nonce.
#[instrument(skip(key, plaintext), fields(size = plaintext.len()), err)]
pub fn seal(
    key: &ArchiveKey,
    path: &str,
    original: u64,
    compression: CompressionMethod,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let aad = associated_data(path, original, compression);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let sealed = cipher(key)
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|_| std::io::Error::other(format!("unable to encrypt {path}")))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt a sealed payload, checking it against the entry's metadata.
#[instrument(skip(key, payload), fields(size = payload.len()), err)]
pub fn open(
    key: &ArchiveKey,
    path: &str,
    original: u64,
    compression: CompressionMethod,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let authentication = || IntegrityError::Authentication {
        path: path.to_owned(),
    };

    if payload.len() < NONCE_SIZE + TAG_SIZE {
        return Err(authentication().into());
    }

    let (nonce, sealed) = payload.split_at(NONCE_SIZE);
    let aad = associated_data(path, original, compression);

    cipher(key)
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: sealed,
                aad: &aad,
            },
        )
        .map_err(|_| authentication().into())
}
