//! Payload encryption for Bark-compatible servers.
//!
//! Title and body are wrapped in a compact JSON object and sealed with
//! AES-256-GCM. The key is SHA-256 of the shared secret (the target's push
//! key).
//!
//! # Wire Format
//!
//! The `data` query value is three `:`-separated segments, each standard
//! base64 then percent-encoded for a URL query:
//!
//! ```text
//! <nonce>:<tag>:<ciphertext>
//! ```
//!
//! # Fixed nonce
//!
//! The nonce is always 12 zero bytes. The receiving service expects exactly
//! this, so it is part of the wire contract and must not be randomized. The
//! consequence is that encryption is deterministic: identical
//! (title, body, secret) triples produce identical envelopes, and an observer
//! can tell when the same notification is sent twice.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::constants::{ENVELOPE_SEPARATOR, NONCE_SIZE, TAG_SIZE};
use crate::error::DispatchError;

/// The all-zero nonce required by the receiving service.
const FIXED_NONCE: [u8; NONCE_SIZE] = [0; NONCE_SIZE];

/// Characters that are not allowed unescaped in a URL query.
///
/// The base64 alphabet passes through untouched; the transport encodes the
/// whole value once more as a query component.
const QUERY_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// An encrypted title/body pair, ready to be sent as the `data` parameter.
///
/// Each field is already base64 and percent-encoded. Built fresh for every
/// send and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionEnvelope {
    /// Encoded nonce.
    pub nonce: String,
    /// Encoded authentication tag.
    pub tag: String,
    /// Encoded ciphertext.
    pub ciphertext: String,
}

impl EncryptionEnvelope {
    /// Joins the segments into the `data` parameter value.
    pub fn to_param(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for EncryptionEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.nonce,
            self.tag,
            self.ciphertext,
            sep = ENVELOPE_SEPARATOR
        )
    }
}

/// Title and body recovered from an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecryptedContent {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
}

/// Escapes `"`, newline, carriage return and tab. Nothing else is touched,
/// backslashes included.
pub fn escape_json_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Builds the compact plaintext object `{"title":"…","body":"…"}`.
pub fn content_json(title: &str, body: &str) -> String {
    format!(
        r#"{{"title":"{}","body":"{}"}}"#,
        escape_json_string(title),
        escape_json_string(body)
    )
}

/// Derives the 256-bit key as SHA-256 of the secret's UTF-8 bytes.
pub fn derive_key(secret: &str) -> Zeroizing<[u8; 32]> {
    let digest = Sha256::digest(secret.as_bytes());
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&digest);
    key
}

/// Encrypts a title/body pair for the `data` parameter.
pub fn encrypt(
    title: &str,
    content: &str,
    secret: &str,
) -> Result<EncryptionEnvelope, DispatchError> {
    let key = derive_key(secret);
    let plaintext = content_json(title, content);
    let (ciphertext, tag) = seal(key.as_slice(), plaintext.as_bytes())?;

    Ok(EncryptionEnvelope {
        nonce: encode_segment(&FIXED_NONCE),
        tag: encode_segment(&tag),
        ciphertext: encode_segment(&ciphertext),
    })
}

/// Seals `plaintext` under `key` with the fixed nonce, returning the
/// ciphertext and the detached tag.
fn seal(key: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>), DispatchError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| DispatchError::EncryptionFailed(format!("invalid key: {e}")))?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&FIXED_NONCE), b"", &mut buffer)
        .map_err(|e| DispatchError::EncryptionFailed(e.to_string()))?;

    Ok((buffer, tag.to_vec()))
}

fn encode_segment(bytes: &[u8]) -> String {
    utf8_percent_encode(&BASE64.encode(bytes), QUERY_SEGMENT).to_string()
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, DispatchError> {
    let unescaped = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|e| DispatchError::EncryptionFailed(format!("{what} is not UTF-8: {e}")))?;
    BASE64
        .decode(unescaped.as_bytes())
        .map_err(|e| DispatchError::EncryptionFailed(format!("invalid {what} encoding: {e}")))
}

/// Opens a `nonce:tag:ciphertext` value produced by [`encrypt`].
///
/// This is the receiver's side of the protocol, used to inspect envelopes.
pub fn decrypt(secret: &str, data: &str) -> Result<DecryptedContent, DispatchError> {
    let segments: Vec<&str> = data.split(ENVELOPE_SEPARATOR).collect();
    let [nonce, tag, ciphertext] = segments.as_slice() else {
        return Err(DispatchError::EncryptionFailed(format!(
            "expected 3 envelope segments, found {}",
            segments.len()
        )));
    };

    let nonce = decode_segment(nonce, "nonce")?;
    let tag = decode_segment(tag, "tag")?;
    let mut buffer = decode_segment(ciphertext, "ciphertext")?;

    if nonce.len() != NONCE_SIZE {
        return Err(DispatchError::EncryptionFailed(format!(
            "nonce must be {NONCE_SIZE} bytes, got {}",
            nonce.len()
        )));
    }
    if tag.len() != TAG_SIZE {
        return Err(DispatchError::EncryptionFailed(format!(
            "tag must be {TAG_SIZE} bytes, got {}",
            tag.len()
        )));
    }

    let key = derive_key(secret);
    let cipher = Aes256Gcm::new_from_slice(key.as_slice())
        .map_err(|e| DispatchError::EncryptionFailed(format!("invalid key: {e}")))?;
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&nonce),
            b"",
            &mut buffer,
            Tag::from_slice(&tag),
        )
        .map_err(|e| DispatchError::EncryptionFailed(format!("decryption failed: {e}")))?;

    serde_json::from_slice(&buffer).map_err(|e| {
        DispatchError::EncryptionFailed(format!("decrypted payload is not valid JSON: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference values for title "Alert", body "Disk full", secret "abc".
    const PINNED_NONCE: &str = "AAAAAAAAAAAAAAAA";
    const PINNED_TAG: &str = "5+TUrNk8zdE5131MenkybQ==";
    const PINNED_CIPHERTEXT: &str = "0ol/4GuTu9CDFllPYW9ubEd7JKSyzTRBV2b14yB3CzsQjm7D";

    #[test]
    fn test_escape_only_quotes_and_whitespace_controls() {
        assert_eq!(escape_json_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_json_string("a\nb\rc\td"), "a\\nb\\rc\\td");
        assert_eq!(escape_json_string("back\\slash"), "back\\slash");
        assert_eq!(escape_json_string("emoji 🚀"), "emoji 🚀");
    }

    #[test]
    fn test_content_json_is_compact() {
        assert_eq!(
            content_json("Alert", "Disk full"),
            r#"{"title":"Alert","body":"Disk full"}"#
        );
    }

    #[test]
    fn test_derive_key_is_sha256_of_secret() {
        let key = derive_key("abc");
        assert_eq!(
            hex_string(key.as_slice()),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_encrypt_matches_pinned_vector() {
        let envelope = encrypt("Alert", "Disk full", "abc").unwrap();
        assert_eq!(envelope.nonce, PINNED_NONCE);
        assert_eq!(envelope.tag, PINNED_TAG);
        assert_eq!(envelope.ciphertext, PINNED_CIPHERTEXT);
        assert_eq!(
            envelope.to_param(),
            format!("{PINNED_NONCE}:{PINNED_TAG}:{PINNED_CIPHERTEXT}")
        );
    }

    /// The fixed zero nonce is required by the receiving service. Encrypting
    /// the same input twice must give byte-identical output.
    #[test]
    fn test_fixed_nonce_makes_encryption_deterministic() {
        let first = encrypt("Alert", "Disk full", "abc").unwrap();
        let second = encrypt("Alert", "Disk full", "abc").unwrap();
        assert_eq!(first.ciphertext, second.ciphertext);
        assert_eq!(first.tag, second.tag);
        assert_eq!(first.nonce, second.nonce);
    }

    #[test]
    fn test_different_secret_changes_ciphertext() {
        let a = encrypt("Alert", "Disk full", "abc").unwrap();
        let b = encrypt("Alert", "Disk full", "abd").unwrap();
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_eq!(a.nonce, b.nonce);
    }

    #[test]
    fn test_envelope_segments_are_non_empty() {
        let envelope = encrypt("", "", "k").unwrap();
        let param = envelope.to_param();
        let segments: Vec<&str> = param.split(':').collect();
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn test_seal_rejects_bad_key_length() {
        let err = seal(&[0u8; 16], b"data").unwrap_err();
        assert!(matches!(err, DispatchError::EncryptionFailed(_)));
    }

    #[test]
    fn test_decrypt_recovers_title_and_body() {
        let envelope = encrypt("Line1\nLine2", "He said \"hi\"\t!", "device-key").unwrap();
        let content = decrypt("device-key", &envelope.to_param()).unwrap();
        assert_eq!(content.title, "Line1\nLine2");
        assert_eq!(content.body, "He said \"hi\"\t!");
    }

    #[test]
    fn test_decrypt_with_wrong_secret_fails() {
        let envelope = encrypt("Alert", "Disk full", "abc").unwrap();
        assert!(matches!(
            decrypt("abd", &envelope.to_param()),
            Err(DispatchError::EncryptionFailed(_))
        ));
    }

    #[test]
    fn test_decrypt_rejects_malformed_envelope() {
        assert!(decrypt("abc", "only:two").is_err());
        assert!(decrypt("abc", "!!:!!:!!").is_err());
    }

    fn hex_string(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
