// SPDX-License-Identifier: MIT

//! Conversions between wire values and SQLite values.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use sqlink_codec::Value;

/// Fully materialised result set of a read query.
///
/// Every row has exactly one value per column, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Borrowed wrapper so wire values can be bound as statement parameters.
pub(crate) struct SqlParam<'a>(pub &'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self.0 {
            Value::Null => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Null)),
            Value::Bool(v) => v.to_sql(),
            Value::Int(v) => v.to_sql(),
            Value::UInt(v) => {
                // SQLite integers are signed 64-bit; larger values have no
                // lossless representation.
                let v = i64::try_from(*v).map_err(|_| {
                    rusqlite::Error::ToSqlConversionFailure(
                        format!("integer {v} exceeds the signed 64-bit range of SQLite").into(),
                    )
                })?;
                Ok(ToSqlOutput::Owned(rusqlite::types::Value::Integer(v)))
            }
            Value::Real(v) => v.to_sql(),
            Value::Text(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            Value::Blob(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(v))),
            Value::Array(_) => Err(rusqlite::Error::ToSqlConversionFailure(
                "arrays cannot be bound as statement parameters".into(),
            )),
            Value::Map(_) => Err(rusqlite::Error::ToSqlConversionFailure(
                "maps cannot be bound as statement parameters".into(),
            )),
        }
    }
}

/// Convert a fetched column value into its wire representation.
pub(crate) fn value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Blob(v.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetched_values_keep_their_type() {
        assert_eq!(value_from_sql(ValueRef::Integer(3)), Value::Int(3));
        assert_eq!(value_from_sql(ValueRef::Real(3.0)), Value::Real(3.0));
        assert_eq!(value_from_sql(ValueRef::Null), Value::Null);
        assert_eq!(
            value_from_sql(ValueRef::Blob(&[1, 2])),
            Value::Blob(vec![1, 2])
        );
    }

    #[test]
    fn oversized_unsigned_fails_at_bind_time() {
        let value = Value::UInt(u64::MAX);
        assert!(SqlParam(&value).to_sql().is_err());
    }

    #[test]
    fn containers_are_not_bindable() {
        let value = Value::Array(vec![]);
        assert!(SqlParam(&value).to_sql().is_err());
    }
}
