//! Value codecs for stored entries.
//!
//! A codec must round-trip: `decode(encode(v))` equals `v` for every value
//! it is ever asked to store.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Encoding or decoding failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Converts a typed value to and from its stored string form.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<String, CodecError>;
    fn decode(&self, raw: &str) -> Result<T, CodecError>;
}

/// Structural JSON codec for any serde type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        serde_json::from_str(raw).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Stores strings verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Codec<String> for RawCodec {
    fn encode(&self, value: &String) -> Result<String, CodecError> {
        Ok(value.clone())
    }

    fn decode(&self, raw: &str) -> Result<String, CodecError> {
        Ok(raw.to_string())
    }
}

type EncodeFn<T> = dyn Fn(&T) -> Result<String, String> + Send + Sync;
type DecodeFn<T> = dyn Fn(&str) -> Result<T, String> + Send + Sync;

/// Codec assembled from a pair of closures.
pub struct FnCodec<T> {
    encode: Box<EncodeFn<T>>,
    decode: Box<DecodeFn<T>>,
}

impl<T> FnCodec<T> {
    pub fn new(
        encode: impl Fn(&T) -> Result<String, String> + Send + Sync + 'static,
        decode: impl Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }
}

impl<T> fmt::Debug for FnCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnCodec")
    }
}

impl<T> Codec<T> for FnCodec<T> {
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        (self.encode)(value).map_err(CodecError::Encode)
    }

    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        (self.decode)(raw).map_err(CodecError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Preferences {
        theme: String,
        font_size: u8,
        pinned: Vec<String>,
        shortcuts: BTreeMap<String, String>,
    }

    #[test]
    fn test_json_codec_round_trips_nested_struct() {
        let prefs = Preferences {
            theme: "dark".to_string(),
            font_size: 14,
            pinned: vec!["inbox".to_string(), "drafts".to_string()],
            shortcuts: BTreeMap::from([("save".to_string(), "ctrl+s".to_string())]),
        };
        let raw = JsonCodec.encode(&prefs).unwrap();
        let decoded: Preferences = JsonCodec.decode(&raw).unwrap();
        assert_eq!(decoded, prefs);
    }

    #[test]
    fn test_json_codec_round_trips_dynamic_values() {
        let value = json!({ "a": [1, 2.5, null, true], "b": { "c": "\u{1F600} \"quoted\"" } });
        let raw = Codec::<serde_json::Value>::encode(&JsonCodec, &value).unwrap();
        let decoded: serde_json::Value = JsonCodec.decode(&raw).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_json_codec_rejects_malformed_input() {
        let result: Result<Vec<u32>, _> = JsonCodec.decode("[1, 2");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_fn_codec() {
        let codec = FnCodec::new(
            |v: &u32| Ok(format!("n={}", v)),
            |raw: &str| {
                raw.strip_prefix("n=")
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(|| format!("not a counter: {}", raw))
            },
        );
        assert_eq!(codec.encode(&42).unwrap(), "n=42");
        assert_eq!(codec.decode("n=42").unwrap(), 42);
        assert_eq!(
            codec.decode("42"),
            Err(CodecError::Decode("not a counter: 42".to_string()))
        );
    }

    #[test]
    fn test_raw_codec_is_identity() {
        let value = "not json at all".to_string();
        assert_eq!(RawCodec.decode(&RawCodec.encode(&value).unwrap()).unwrap(), value);
    }
}
