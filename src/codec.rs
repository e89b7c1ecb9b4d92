//! Entry encoding supplied by the caller.
//!
//! The queue stores opaque bytes; a [`Codec`] maps the caller's item type to
//! that byte form and back. `decode(encode(x))` must reproduce a value equal
//! to `x` for every value the queue is used with.

use crate::error::Result;

/// Serialize/deserialize capability pair for queue items.
///
/// Both directions must be pure: no side effects, no dependence on prior
/// calls. Failures are surfaced as [`Error::Codec`](crate::Error::Codec)
/// from the `add` or `remove` that hit them.
pub trait Codec<T> {
    fn encode(&self, item: &T) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// Identity codec over raw byte vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn encode(&self, item: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(item.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

#[cfg(feature = "json")]
pub use self::json::JsonCodec;

#[cfg(feature = "json")]
mod json {
    use std::marker::PhantomData;

    use serde::de::DeserializeOwned;
    use serde::Serialize;

    use super::Codec;
    use crate::error::{Error, Result};

    /// JSON codec for any `Serialize + DeserializeOwned` item type.
    #[derive(Debug)]
    pub struct JsonCodec<T> {
        _marker: PhantomData<fn() -> T>,
    }

    impl<T> JsonCodec<T> {
        pub fn new() -> Self {
            Self {
                _marker: PhantomData,
            }
        }
    }

    impl<T> Default for JsonCodec<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T> Clone for JsonCodec<T> {
        fn clone(&self) -> Self {
            Self::new()
        }
    }

    impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec<T> {
        fn encode(&self, item: &T) -> Result<Vec<u8>> {
            serde_json::to_vec(item).map_err(|err| Error::Codec(Box::new(err)))
        }

        fn decode(&self, bytes: &[u8]) -> Result<T> {
            serde_json::from_slice(bytes).map_err(|err| Error::Codec(Box::new(err)))
        }
    }
}
