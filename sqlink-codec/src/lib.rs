// SPDX-License-Identifier: MIT

//! MessagePack codec for the sqlink bridge.
//!
//! The bridge exchanges opaque msgpack payloads with its front-end. This crate
//! owns the value type of that exchange and the encode/decode entry points;
//! it performs no I/O and has no knowledge of the database.

mod error;
mod request;
mod value;

pub use error::{CodecError, Result};
pub use request::{Blob, ExportRequest, ImportRequest, QueryMode, QueryRequest};
pub use value::Value;

/// Encode a value into its msgpack representation.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(value)?)
}

/// Decode a msgpack payload into a [`Value`].
pub fn decode(bytes: &[u8]) -> Result<Value> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Decode a msgpack payload into a typed request body.
pub fn decode_as<'a, T: serde::Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}
