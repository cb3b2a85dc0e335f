//! Maps decoded commands onto the connection manager or the filesystem.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;

use sqlink_codec::{
    CodecError, ExportRequest, ImportRequest, QueryMode, QueryRequest, Value,
};
use sqlink_db::{BridgeDb, QueryResult};
use thiserror::Error;
use tracing::debug;

/// The three commands the bridge understands, identified by their path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Query,
    Import,
    Export,
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "/query" => Self::Query,
            "/import" => Self::Import,
            "/export" => Self::Export,
            _ => return Err(()),
        })
    }
}

/// Per-command failures. Each one fails a single command and leaves the
/// dispatch loop running; the `Display` text becomes the failure payload.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{0}")]
    Codec(#[from] CodecError),

    #[error("Invalid path: {0}")]
    UnknownCommand(String),

    /// Engine failure, enriched with the offending query and parameters so
    /// the front-end can reproduce it.
    #[error("{source}\nQuery: {query}\nParams: {params}")]
    Query {
        #[source]
        source: sqlink_db::Error,
        query: String,
        params: String,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Owns the connection manager and the working directory for file commands.
///
/// One command is fully processed per call; the dispatcher holds no state
/// across calls beyond the open handles.
pub struct Dispatcher {
    db: BridgeDb,
    workdir: PathBuf,
}

impl Dispatcher {
    pub fn new(db: BridgeDb, workdir: PathBuf) -> Self {
        Self { db, workdir }
    }

    /// Dispatch one command: decode the body, run the operation, encode the
    /// response payload. A decode failure never reaches the database.
    pub fn dispatch(&mut self, path: &str, body: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let command = path
            .parse::<Command>()
            .map_err(|()| DispatchError::UnknownCommand(path.to_owned()))?;
        debug!(?command, "dispatching");
        match command {
            Command::Query => self.query(body),
            Command::Import => self.import(body),
            Command::Export => self.export(body),
        }
    }

    fn query(&mut self, body: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let req: QueryRequest = sqlink_codec::decode_as(body)?;

        let outcome = match req.mode {
            QueryMode::Write => self.db.execute_write(&req.query, &req.params).map(|()| None),
            QueryMode::Read => self.db.execute_read(&req.query, &req.params),
        };

        let value = match outcome {
            Ok(None) => Value::Null,
            Ok(Some(result)) => result_to_value(result),
            Err(source) => {
                return Err(DispatchError::Query {
                    source,
                    query: req.query,
                    params: render_params(&req.params),
                });
            }
        };
        Ok(sqlink_codec::encode(&value)?)
    }

    fn import(&mut self, body: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let req: ImportRequest = sqlink_codec::decode_as(body)?;
        let path = self.workdir.join(&req.filepath);
        let data = std::fs::read(&path).map_err(|e| DispatchError::Io {
            context: format!("Failed to read '{}'", path.display()),
            source: e,
        })?;
        Ok(sqlink_codec::encode(&Value::Blob(data))?)
    }

    fn export(&mut self, body: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let req: ExportRequest = sqlink_codec::decode_as(body)?;
        let path = self.workdir.join(&req.filepath);
        std::fs::write(&path, &req.data.0).map_err(|e| DispatchError::Io {
            context: format!("Failed to write '{}'", path.display()),
            source: e,
        })?;
        Ok(sqlink_codec::encode(&Value::Null)?)
    }

    /// Shut down the connection manager (checkpointing the write handle).
    pub fn close(self) -> sqlink_db::Result<()> {
        self.db.close()
    }
}

/// Wrap a materialised result set as the canonical `{columns, records}`
/// response value. Each record is a map whose key order equals the column
/// order.
fn result_to_value(result: QueryResult) -> Value {
    let QueryResult { columns, rows } = result;
    let records = rows
        .into_iter()
        .map(|row| Value::Map(columns.iter().cloned().zip(row).collect()))
        .collect();
    Value::Map(vec![
        (
            "columns".to_owned(),
            Value::Array(columns.into_iter().map(Value::Text).collect()),
        ),
        ("records".to_owned(), Value::Array(records)),
    ])
}

fn render_params(params: &[Value]) -> String {
    let mut out = String::from("[");
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{param}");
    }
    out.push(']');
    out
}
