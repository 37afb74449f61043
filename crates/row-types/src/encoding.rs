//! Text rendering for opaque byte sequences.
//!
//! Keys, column identifiers and values are raw bytes. Whenever they have to
//! cross a text boundary (JSON report, JSONL snapshot files) they are
//! rendered as:
//!
//! - the bytes themselves, when they are valid UTF-8 and do not start with
//!   the [`BASE64_PREFIX`] marker;
//! - `base64:` followed by standard base64 otherwise.
//!
//! The rendering is lossless: `decode_bytes(&encode_bytes(b)) == b` for
//! every input.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Marker for base64-rendered byte sequences.
pub const BASE64_PREFIX: &str = "base64:";

/// Error decoding a rendered byte sequence.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid base64 payload '{input}': {source}")]
    Base64 {
        input: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// Render raw bytes as text.
pub fn encode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.starts_with(BASE64_PREFIX) => text.to_string(),
        _ => format!("{BASE64_PREFIX}{}", STANDARD.encode(bytes)),
    }
}

/// Parse text produced by [`encode_bytes`] (or plain text) back into bytes.
pub fn decode_bytes(text: &str) -> Result<Vec<u8>, DecodeError> {
    match text.strip_prefix(BASE64_PREFIX) {
        Some(payload) => STANDARD
            .decode(payload)
            .map_err(|source| DecodeError::Base64 {
                input: text.to_string(),
                source,
            }),
        None => Ok(text.as_bytes().to_vec()),
    }
}

/// Serde adapter for `Vec<u8>` fields rendered with [`encode_bytes`].
pub mod as_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_bytes(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::decode_bytes(&text).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Vec<Vec<u8>>` fields, one [`encode_bytes`] string per item.
pub mod as_text_seq {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&super::encode_bytes(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|text| super::decode_bytes(text).map_err(serde::de::Error::custom))
            .collect()
    }
}
