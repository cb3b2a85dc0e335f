// SPDX-License-Identifier: MIT

//! Dual-capability SQLite connection manager for the sqlink bridge.
//!
//! This crate owns the two long-lived handles onto the bridged database
//! file: a read-only handle (enforced by an explicit open flag) and a
//! read-write handle, plus the shared scratch database attached to both and
//! the `matches` search function the front-end's find widget relies on.
//! Transports never touch a connection directly; everything goes through
//! [`BridgeDb`].

mod connection;
mod error;
mod matcher;
mod query;
mod types;
mod write;

pub use connection::{BridgeDb, SCRATCH_ALIAS};
pub use error::{Error, Result};
pub use types::QueryResult;
