//! HAL `_embedded` envelope handling.
//!
//! Collection endpoints of the projects API answer with
//!
//! ```json
//! { "_embedded": { "releases": [ ... ] }, "_links": { ... } }
//! ```
//!
//! [`HalEnvelope`] decodes the outer object and hands back the inner array.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why an envelope could not be unwrapped.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The body has no `_embedded` object.
    #[error("response has no _embedded object")]
    MissingEmbedded,

    /// `_embedded` has no entry for the expected key.
    #[error("_embedded has no '{key}' entry")]
    MissingKey {
        /// The expected key.
        key: String,
    },

    /// The entry exists but is not an array.
    #[error("_embedded.{key} is not an array")]
    NotAnArray {
        /// The expected key.
        key: String,
    },

    /// The array holds an element that does not decode as a record.
    #[error("_embedded.{key} has an invalid record: {source}")]
    InvalidRecord {
        /// The expected key.
        key: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// One-level HAL envelope. Only `_embedded` is kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HalEnvelope {
    #[serde(rename = "_embedded", default)]
    embedded: Option<Map<String, Value>>,
}

impl HalEnvelope {
    /// Decodes an envelope from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MissingEmbedded`] if the value is not an object
    /// or `_embedded` is not an object.
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        serde_json::from_value(value).map_err(|_| EnvelopeError::MissingEmbedded)
    }

    /// Returns the records stored under `_embedded.<key>`, in upstream order.
    ///
    /// An empty array yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns an error if `_embedded` or the key is missing, the entry is not
    /// an array, or a record fails to decode.
    pub fn unwrap_embedded<T: DeserializeOwned>(self, key: &str) -> Result<Vec<T>, EnvelopeError> {
        let mut embedded = self.embedded.ok_or(EnvelopeError::MissingEmbedded)?;

        let entry = embedded
            .remove(key)
            .ok_or_else(|| EnvelopeError::MissingKey {
                key: key.to_string(),
            })?;

        if !entry.is_array() {
            return Err(EnvelopeError::NotAnArray {
                key: key.to_string(),
            });
        }

        serde_json::from_value(entry).map_err(|source| EnvelopeError::InvalidRecord {
            key: key.to_string(),
            source,
        })
    }
}
