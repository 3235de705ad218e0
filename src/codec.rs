use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Turns values into the bytes handed to the backend and back.
pub trait Codec
{
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>>;
    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec
{
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>>
    {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V>
    {
        Ok(serde_json::from_slice(bytes)?)
    }
}
