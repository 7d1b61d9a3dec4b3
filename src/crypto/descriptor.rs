//! Encrypted project descriptor codec
//!
//! The descriptor is stored as AES-128-CBC ciphertext with PKCS#5 padding.
//! Key and IV are the same fixed 16 bytes. This is a compatibility format
//! shared with existing project stores, not a confidentiality boundary, so
//! the key material, mode and padding must never change.

use std::fs;
use std::path::Path;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use tracing::debug;

use crate::error::{InterchangeError, InterchangeResult};
use crate::models::ProjectDescriptor;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Fixed key, also used as the IV
const DESCRIPTOR_KEY: &[u8; 16] = b"sketchwaresecure";

/// Encrypt a descriptor into its on-disk byte form
pub fn encode(descriptor: &ProjectDescriptor) -> InterchangeResult<Vec<u8>> {
    let json = serde_json::to_string(descriptor)?;
    encrypt_text(&json)
}

/// Decrypt on-disk bytes into a descriptor
///
/// Any cipher, padding, UTF-8 or JSON failure is reported as
/// [`InterchangeError::Descriptor`].
pub fn decode(bytes: &[u8]) -> InterchangeResult<ProjectDescriptor> {
    let text = decrypt_text(bytes)?;
    serde_json::from_str(text.trim())
        .map_err(|e| InterchangeError::Descriptor(format!("Invalid descriptor payload: {}", e)))
}

/// Encrypt arbitrary text under the descriptor key
///
/// Surrounding whitespace is trimmed before encryption.
pub fn encrypt_text(text: &str) -> InterchangeResult<Vec<u8>> {
    let cipher = Aes128CbcEnc::new_from_slices(DESCRIPTOR_KEY, DESCRIPTOR_KEY)
        .map_err(|e| InterchangeError::Descriptor(format!("Failed to create cipher: {}", e)))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(text.trim().as_bytes()))
}

/// Decrypt bytes produced by [`encrypt_text`]
pub fn decrypt_text(bytes: &[u8]) -> InterchangeResult<String> {
    let cipher = Aes128CbcDec::new_from_slices(DESCRIPTOR_KEY, DESCRIPTOR_KEY)
        .map_err(|e| InterchangeError::Descriptor(format!("Failed to create cipher: {}", e)))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(bytes)
        .map_err(|_| InterchangeError::Descriptor("Decryption failed: bad padding".into()))?;

    String::from_utf8(plaintext)
        .map_err(|e| InterchangeError::Descriptor(format!("Invalid UTF-8 in descriptor: {}", e)))
}

/// Read and decode a descriptor file
pub fn read_descriptor(path: &Path) -> InterchangeResult<ProjectDescriptor> {
    let bytes = fs::read(path).map_err(|e| {
        InterchangeError::Descriptor(format!("Failed to read {}: {}", path.display(), e))
    })?;
    decode(&bytes)
}

/// Encode a descriptor and write it, replacing any previous content
pub fn write_descriptor(path: &Path, descriptor: &ProjectDescriptor) -> InterchangeResult<()> {
    let bytes = encode(descriptor)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes).map_err(|e| {
        InterchangeError::Descriptor(format!("Failed to write {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), "descriptor written");
    Ok(())
}
