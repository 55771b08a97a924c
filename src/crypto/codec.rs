//! Template codec: ciphertext bytes <-> text-safe storable blob.
//!
//! Blobs are zlib-compressed and then standard base64 encoded.

use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::ckks::{Ciphertext, CkksContext};
use crate::error::{BiometricError, BiometricResult};

/// Upper bound on a decompressed template.
const MAX_TEMPLATE_BYTES: u64 = 64 * 1024 * 1024;

pub fn encode(raw: &[u8]) -> BiometricResult<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(raw)
        .and_then(|_| encoder.finish())
        .map(|compressed| BASE64.encode(compressed))
        .map_err(|error| BiometricError::Internal(format!("zlib compression failed: {error}")))
}

pub fn decode(blob: &str) -> BiometricResult<Vec<u8>> {
    let compressed = BASE64
        .decode(blob.trim())
        .map_err(|error| BiometricError::Codec(format!("invalid base64: {error}")))?;

    let mut raw = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(MAX_TEMPLATE_BYTES + 1)
        .read_to_end(&mut raw)
        .map_err(|error| BiometricError::Codec(format!("invalid zlib stream: {error}")))?;
    if raw.len() as u64 > MAX_TEMPLATE_BYTES {
        return Err(BiometricError::Codec(format!(
            "template exceeds {MAX_TEMPLATE_BYTES} bytes when decompressed"
        )));
    }
    Ok(raw)
}

/// An encrypted biometric vector in its storable form.
///
/// Holds only ciphertext; key material never passes through here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedTemplate(String);

impl EncryptedTemplate {
    pub fn seal(ciphertext: &Ciphertext) -> BiometricResult<Self> {
        let raw = ciphertext.to_bytes()?;
        Ok(Self(encode(&raw)?))
    }

    /// Decode and deserialize under `context`. Any failure, including a
    /// ciphertext from a different context, means the blob is unusable.
    pub fn open(&self, context: &CkksContext) -> BiometricResult<Ciphertext> {
        let raw = decode(&self.0)?;
        Ciphertext::from_bytes(&raw, context)
            .map_err(|error| BiometricError::Codec(format!("undecodable ciphertext: {error}")))
    }

    pub fn from_blob(blob: impl Into<String>) -> Self {
        Self(blob.into())
    }

    /// Rebuild from bytes read back from a store.
    pub fn from_stored(bytes: &[u8]) -> BiometricResult<Self> {
        std::str::from_utf8(bytes)
            .map(Self::from_blob)
            .map_err(|error| BiometricError::Codec(format!("stored blob is not text: {error}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_arbitrary_bytes() {
        for raw in [Vec::new(), vec![0u8; 4096], (0..=255u8).collect::<Vec<_>>()] {
            assert_eq!(decode(&encode(&raw).unwrap()).unwrap(), raw);
        }
    }

    #[test]
    fn test_blob_is_text_safe() {
        let blob = encode(b"\x00\xff\x10binary").unwrap();
        assert!(blob
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')));
    }

    #[test]
    fn test_invalid_base64_is_codec_error() {
        assert!(matches!(decode("not*base64!"), Err(BiometricError::Codec(_))));
    }

    #[test]
    fn test_invalid_zlib_is_codec_error() {
        let blob = BASE64.encode(b"plain bytes, not zlib");
        assert!(matches!(decode(&blob), Err(BiometricError::Codec(_))));
    }

    #[test]
    fn test_stored_bytes_must_be_utf8() {
        assert!(matches!(
            EncryptedTemplate::from_stored(&[0xff, 0xfe]),
            Err(BiometricError::Codec(_))
        ));
        let template = EncryptedTemplate::from_stored(b"abc=").unwrap();
        assert_eq!(template.as_str(), "abc=");
    }
}
