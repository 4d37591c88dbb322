use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        // Dropping the transaction on error rolls back a partial schema.
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS niv (
                book_id     INTEGER NOT NULL,
                book        TEXT NOT NULL,
                chapter     INTEGER NOT NULL,
                verse       INTEGER NOT NULL,
                text        TEXT NOT NULL,
                PRIMARY KEY (book_id, chapter, verse)
            );

            CREATE TABLE users (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                email               TEXT NOT NULL UNIQUE,
                password            TEXT NOT NULL,
                first_name          TEXT NOT NULL,
                last_name           TEXT NOT NULL,
                age                 INTEGER NOT NULL,
                believer_category   INTEGER NOT NULL,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE TABLE user_favorite_verses (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                book_id     INTEGER NOT NULL,
                chapter     INTEGER NOT NULL,
                verse       INTEGER NOT NULL,
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, book_id, chapter, verse)
            );

            CREATE INDEX idx_favorites_user
                ON user_favorite_verses(user_id, created_at);

            CREATE TABLE user_highlighted_verses (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                book_id     INTEGER NOT NULL,
                chapter     INTEGER NOT NULL,
                verse       INTEGER NOT NULL,
                note        TEXT NOT NULL DEFAULT '',
                color       TEXT NOT NULL DEFAULT 'yellow',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                UNIQUE(user_id, book_id, chapter, verse)
            );

            CREATE INDEX idx_highlights_user
                ON user_highlighted_verses(user_id, updated_at);

            CREATE TABLE user_last_read (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                book_id     INTEGER NOT NULL,
                book_name   TEXT NOT NULL,
                chapter     INTEGER NOT NULL,
                verse       INTEGER NOT NULL,
                updated_at  TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt.query_map([], |r| r.get(0)).unwrap().map(|r| r.unwrap()).collect();
        names
    }

    #[test]
    fn rerun_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();
        let version: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn failed_v1_leaves_no_partial_schema() {
        let conn = Connection::open_in_memory().unwrap();
        // A clashing index name makes v1 fail after `users` has been created.
        conn.execute_batch("CREATE TABLE clash (x INTEGER); CREATE INDEX idx_favorites_user ON clash(x);")
            .unwrap();

        assert!(run(&conn).is_err());
        let after_failure = tables(&conn);
        assert!(!after_failure.contains(&"users".to_string()), "{after_failure:?}");

        conn.execute_batch("DROP INDEX idx_favorites_user;").unwrap();
        run(&conn).unwrap();
        assert!(tables(&conn).contains(&"users".to_string()));
    }
}
