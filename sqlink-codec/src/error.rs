// SPDX-License-Identifier: MIT

//! Error types for wire encoding and decoding.

use thiserror::Error;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while encoding or decoding payloads.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Malformed incoming payload
    #[error("Failed to decode the request body: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Response value could not be serialized
    #[error("Failed to encode the response body: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}
