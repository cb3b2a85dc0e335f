// SPDX-License-Identifier: MIT

//! Decoded request payloads for the three bridge commands.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Caller-declared intent for a `/query` command.
///
/// Selects which handle executes the statement; the read-only handle enforces
/// the capability regardless of what the caller claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMode {
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "write")]
    Write,
}

/// Request body of `/query`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub params: Vec<Value>,
    pub mode: QueryMode,
}

/// Request body of `/import`. The path is resolved against the configured
/// working directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportRequest {
    pub filepath: String,
}

/// Request body of `/export`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportRequest {
    pub filepath: String,
    pub data: Blob,
}

/// Byte payload that deserializes from the msgpack bin family rather than a
/// sequence of integers.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob(pub Vec<u8>);

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct BlobVisitor;

        impl serde::de::Visitor<'_> for BlobVisitor {
            type Value = Blob;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a byte array")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Blob, E>
            where
                E: serde::de::Error,
            {
                Ok(Blob(v.to_vec()))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Blob, E>
            where
                E: serde::de::Error,
            {
                Ok(Blob(v))
            }
        }

        deserializer.deserialize_bytes(BlobVisitor)
    }
}

impl Serialize for Blob {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}
