// SPDX-License-Identifier: MIT

//! Read execution on the read-only handle.

use rusqlite::Statement;
use sqlink_codec::Value;

use crate::connection::BridgeDb;
use crate::error::{Error, Result};
use crate::types::{value_from_sql, QueryResult, SqlParam};

impl BridgeDb {
    /// Execute a statement on the read-only handle.
    ///
    /// The result set is fully materialised before returning; statement state
    /// does not outlive this call. Returns `Ok(None)` when the statement
    /// produced no column metadata (schema or write statements), which is
    /// distinct from an empty result set. A statement with write effects
    /// fails here with SQLite's read-only error no matter what mode the
    /// caller claimed.
    pub fn execute_read(&self, query: &str, params: &[Value]) -> Result<Option<QueryResult>> {
        let mut stmt = self.reader.prepare(query)?;
        bind_params(&mut stmt, params)?;

        if stmt.column_count() == 0 {
            stmt.raw_execute()?;
            return Ok(None);
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|name| name.to_owned())
            .collect();

        let mut fetched = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                record.push(value_from_sql(row.get_ref(i)?));
            }
            fetched.push(record);
        }

        Ok(Some(QueryResult {
            columns,
            rows: fetched,
        }))
    }
}

/// Bind wire values positionally, translating conversion failures into a
/// parameter-indexed error.
pub(crate) fn bind_params(stmt: &mut Statement<'_>, params: &[Value]) -> Result<()> {
    for (i, param) in params.iter().enumerate() {
        stmt.raw_bind_parameter(i + 1, SqlParam(param))
            .map_err(|e| match e {
                rusqlite::Error::ToSqlConversionFailure(reason) => Error::UnbindableParameter {
                    index: i + 1,
                    reason: reason.to_string(),
                },
                e => Error::Sqlite(e),
            })?;
    }
    Ok(())
}
