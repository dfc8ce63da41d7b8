//! Opaque keyset cursor encoding.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors raised while encoding or decoding a cursor token.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CursorError {
    /// The token is not valid URL-safe base64.
    #[error("cursor is not valid base64: {message}")]
    InvalidEncoding {
        /// Decoder failure description.
        message: String,
    },
    /// The decoded payload does not match the expected key shape.
    #[error("cursor payload is malformed: {message}")]
    InvalidPayload {
        /// Deserialisation failure description.
        message: String,
    },
    /// The key could not be serialised.
    #[error("cursor key could not be serialised: {message}")]
    Serialize {
        /// Serialisation failure description.
        message: String,
    },
}

/// Keyset position wrapped as an opaque token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<K> {
    key: K,
}

impl<K> Cursor<K> {
    /// Wrap a key.
    pub const fn new(key: K) -> Self {
        Self { key }
    }

    /// Borrow the key.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Consume the cursor, returning the key.
    pub fn into_inner(self) -> K {
        self.key
    }
}

impl<K: Serialize> Cursor<K> {
    /// Encode the key as URL-safe base64 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Serialize`] when the key cannot be serialised.
    pub fn encode(&self) -> Result<String, CursorError> {
        let json = serde_json::to_vec(&self.key).map_err(|err| CursorError::Serialize {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

impl<K: DeserializeOwned> Cursor<K> {
    /// Decode a token produced by [`Cursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::InvalidEncoding`] for malformed base64 and
    /// [`CursorError::InvalidPayload`] when the JSON does not match `K`.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes =
            URL_SAFE_NO_PAD
                .decode(token.trim())
                .map_err(|err| CursorError::InvalidEncoding {
                    message: err.to_string(),
                })?;
        let key = serde_json::from_slice(&bytes).map_err(|err| CursorError::InvalidPayload {
            message: err.to_string(),
        })?;
        Ok(Self { key })
    }
}
