// SPDX-License-Identifier: MIT

//! Write execution on the read-write handle.

use sqlink_codec::Value;

use crate::connection::BridgeDb;
use crate::error::Result;
use crate::query::bind_params;

impl BridgeDb {
    /// Execute a statement on the read-write handle inside an explicit
    /// transaction.
    ///
    /// The transaction commits only if the statement succeeds; on any error
    /// it rolls back, so a failed multi-row insert leaves zero rows. Rows
    /// produced by the statement (RETURNING clauses, pragma queries) are
    /// drained and discarded so the statement runs to completion; the caller
    /// only sees success or an error.
    pub fn execute_write(&mut self, query: &str, params: &[Value]) -> Result<()> {
        let tx = self.writer.transaction()?;
        {
            let mut stmt = tx.prepare(query)?;
            bind_params(&mut stmt, params)?;
            let mut rows = stmt.raw_query();
            while rows.next()?.is_some() {}
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlink_codec::Value;

    fn test_db() -> (tempfile::TempDir, BridgeDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = BridgeDb::open(dir.path().join("test.db"), None).unwrap();
        (dir, db)
    }

    #[test]
    fn create_insert_select() {
        let (_dir, mut db) = test_db();
        db.execute_write("CREATE TABLE t(x, y)", &[]).unwrap();
        db.execute_write(
            "INSERT INTO t(x, y) VALUES (?, ?)",
            &[Value::Int(10), Value::Int(20)],
        )
        .unwrap();

        let result = db
            .execute_read("SELECT * FROM t ORDER BY rowid", &[])
            .unwrap()
            .unwrap();
        assert_eq!(result.columns, vec!["x", "y"]);
        assert_eq!(result.rows, vec![vec![Value::Int(10), Value::Int(20)]]);
        db.close().unwrap();
    }

    #[test]
    fn writes_are_visible_to_the_reader() {
        let (_dir, mut db) = test_db();
        db.execute_write("CREATE TABLE t(v)", &[]).unwrap();
        db.execute_write("INSERT INTO t VALUES (1)", &[]).unwrap();
        let result = db.execute_read("SELECT v FROM t", &[]).unwrap().unwrap();
        assert_eq!(result.rows.len(), 1);
        db.close().unwrap();
    }

    #[test]
    fn failed_statement_leaves_no_partial_effect() {
        let (_dir, mut db) = test_db();
        db.execute_write("CREATE TABLE t(v UNIQUE)", &[]).unwrap();

        // The second row violates the constraint; the first must roll back.
        let err = db.execute_write(
            "INSERT INTO t(v) SELECT 1 UNION ALL SELECT 1",
            &[],
        );
        assert!(err.is_err());

        let result = db
            .execute_read("SELECT COUNT(*) AS n FROM t", &[])
            .unwrap()
            .unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int(0)]]);
        db.close().unwrap();
    }

    #[test]
    fn returning_clause_commits_and_discards_rows() {
        let (_dir, mut db) = test_db();
        db.execute_write("CREATE TABLE t(v)", &[]).unwrap();
        db.execute_write("INSERT INTO t(v) VALUES (1) RETURNING rowid", &[])
            .unwrap();

        let result = db
            .execute_read("SELECT COUNT(*) AS n FROM t", &[])
            .unwrap()
            .unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int(1)]]);
        db.close().unwrap();
    }

    #[test]
    fn row_producing_statement_succeeds_in_write_mode() {
        let (_dir, mut db) = test_db();
        db.execute_write("SELECT 1, 2, 3", &[]).unwrap();
        db.execute_write("PRAGMA user_version", &[]).unwrap();
        db.close().unwrap();
    }

    #[test]
    fn syntax_error_is_reported() {
        let (_dir, mut db) = test_db();
        assert!(db.execute_write("NOT A STATEMENT", &[]).is_err());
        db.close().unwrap();
    }
}
