use chrono::Utc;
use lumen_types::models::{Book, Verse, VerseRef};
use rusqlite::{Connection, Row, params};
use tracing::warn;

use crate::Database;
use crate::error::{Result, StoreError, is_foreign_key_violation, is_unique_violation};
use crate::models::{FavoriteRow, HighlightRow, LastReadRow, NewLastRead, NewUser, UserRow, UserUpdate};
use crate::password;
use crate::store::{DEFAULT_HIGHLIGHT_COLOR, Store};

const USER_COLUMNS: &str =
    "id, email, password, first_name, last_name, age, believer_category, created_at, updated_at";

// Activity rows are joined to the scripture table so responses carry the
// book name and verse text.
const FAVORITE_SELECT: &str = "
    SELECT f.id, f.user_id, f.book_id, f.chapter, f.verse,
           COALESCE(n.book, ''), COALESCE(n.text, ''), f.created_at
    FROM user_favorite_verses f
    LEFT JOIN niv n ON n.book_id = f.book_id AND n.chapter = f.chapter AND n.verse = f.verse";

const HIGHLIGHT_SELECT: &str = "
    SELECT h.id, h.user_id, h.book_id, h.chapter, h.verse, h.note, h.color,
           COALESCE(n.book, ''), COALESCE(n.text, ''), h.created_at, h.updated_at
    FROM user_highlighted_verses h
    LEFT JOIN niv n ON n.book_id = h.book_id AND n.chapter = h.chapter AND n.verse = h.verse";

const LAST_READ_SELECT: &str = "
    SELECT l.id, l.user_id, l.book_id, l.book_name, l.chapter, l.verse,
           COALESCE(n.text, ''), l.updated_at
    FROM user_last_read l
    LEFT JOIN niv n ON n.book_id = l.book_id AND n.chapter = l.chapter AND n.verse = l.verse";

impl Store for Database {
    fn ready(&self) -> bool {
        self.with_conn(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?))
            .map(|one| one == 1)
            .unwrap_or_else(|e| {
                warn!("Readiness probe failed: {}", e);
                false
            })
    }

    // -- Scripture --

    fn list_verses(&self) -> Result<Vec<Verse>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT book_id, book, chapter, verse, text FROM niv ORDER BY book_id, chapter, verse",
            )?;
            let rows = stmt
                .query_map([], verse_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn list_verses_by_chapter(&self, book_id: i64, chapter: i64) -> Result<Vec<Verse>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT book_id, book, chapter, verse, text FROM niv
                 WHERE book_id = ?1 AND chapter = ?2
                 ORDER BY verse",
            )?;
            let rows = stmt
                .query_map(params![book_id, chapter], verse_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT book_id, book FROM niv ORDER BY book_id")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Book {
                        book_id: row.get(0)?,
                        book: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn max_chapter(&self, book_id: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT MAX(chapter) FROM niv WHERE book_id = ?1", [book_id], |row| {
                row.get(0)
            })?)
        })
    }

    fn count_verses(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM niv", [], |row| row.get(0))?))
    }

    fn import_verses(&self, verses: &[Verse]) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            let mut inserted = 0;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO niv (book_id, book, chapter, verse, text)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for v in verses {
                    inserted += stmt.execute(params![v.book_id, v.book, v.chapter, v.verse, v.text])?;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
    }

    // -- Users --

    fn create_user(&self, user: &NewUser) -> Result<UserRow> {
        let password_hash = password::hash(&user.password)?;
        let now = Utc::now();

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (email, password, first_name, last_name, age, believer_category, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    user.email,
                    password_hash,
                    user.first_name,
                    user.last_name,
                    user.age,
                    user.believer_category,
                    now,
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict("email already registered")
                } else {
                    e.into()
                }
            })?;

            let id = conn.last_insert_rowid();
            query_user(conn, "id = ?1", id)?.ok_or(StoreError::NotFound("user"))
        })
    }

    fn get_user_by_id(&self, id: i64) -> Result<UserRow> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id)?.ok_or(StoreError::NotFound("user")))
    }

    fn get_user_by_email(&self, email: &str) -> Result<UserRow> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email)?.ok_or(StoreError::NotFound("user")))
    }

    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    first_name = COALESCE(?1, first_name),
                    last_name = COALESCE(?2, last_name),
                    age = COALESCE(?3, age),
                    believer_category = COALESCE(?4, believer_category),
                    updated_at = ?5
                 WHERE id = ?6",
                params![
                    update.first_name,
                    update.last_name,
                    update.age,
                    update.believer_category,
                    Utc::now(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }
            Ok(())
        })
    }

    fn delete_user(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }
            Ok(())
        })
    }

    // -- Favorites --

    fn add_favorite_verse(&self, user_id: i64, verse: VerseRef) -> Result<FavoriteRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_favorite_verses (user_id, book_id, chapter, verse, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, verse.book_id, verse.chapter, verse.verse, Utc::now()],
            )
            .map_err(|e| activity_write_error(e, "verse already in favorites"))?;

            let id = conn.last_insert_rowid();
            let sql = format!("{FAVORITE_SELECT} WHERE f.id = ?1");
            Ok(conn.query_row(&sql, [id], favorite_from_row)?)
        })
    }

    fn get_favorite_verses(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<FavoriteRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{FAVORITE_SELECT} WHERE f.user_id = ?1 ORDER BY f.created_at DESC, f.id DESC LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, limit, offset], favorite_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn count_favorite_verses(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM user_favorite_verses WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?)
        })
    }

    fn remove_favorite_verse(&self, user_id: i64, verse: VerseRef) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "DELETE FROM user_favorite_verses
                 WHERE user_id = ?1 AND book_id = ?2 AND chapter = ?3 AND verse = ?4",
                params![user_id, verse.book_id, verse.chapter, verse.verse],
            )?;
            Ok(())
        })
    }

    fn is_favorite_verse(&self, user_id: i64, verse: VerseRef) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM user_favorite_verses
                 WHERE user_id = ?1 AND book_id = ?2 AND chapter = ?3 AND verse = ?4",
                params![user_id, verse.book_id, verse.chapter, verse.verse],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    // -- Highlights --

    fn add_highlighted_verse(
        &self,
        user_id: i64,
        verse: VerseRef,
        note: &str,
        color: &str,
    ) -> Result<HighlightRow> {
        let color = if color.is_empty() { DEFAULT_HIGHLIGHT_COLOR } else { color };
        let now = Utc::now();

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_highlighted_verses (user_id, book_id, chapter, verse, note, color, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![user_id, verse.book_id, verse.chapter, verse.verse, note, color, now],
            )
            .map_err(|e| activity_write_error(e, "verse already highlighted"))?;

            let id = conn.last_insert_rowid();
            let sql = format!("{HIGHLIGHT_SELECT} WHERE h.id = ?1");
            Ok(conn.query_row(&sql, [id], highlight_from_row)?)
        })
    }

    fn get_highlighted_verses(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<HighlightRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{HIGHLIGHT_SELECT} WHERE h.user_id = ?1 ORDER BY h.updated_at DESC, h.id DESC LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, limit, offset], highlight_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn count_highlighted_verses(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM user_highlighted_verses WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?)
        })
    }

    fn update_highlighted_verse(&self, user_id: i64, verse: VerseRef, note: &str, color: &str) -> Result<()> {
        if note.is_empty() && color.is_empty() {
            // Nothing to write, but a missing row is still reported.
            let exists = self.with_conn(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM user_highlighted_verses
                     WHERE user_id = ?1 AND book_id = ?2 AND chapter = ?3 AND verse = ?4",
                    params![user_id, verse.book_id, verse.chapter, verse.verse],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })?;
            return if exists { Ok(()) } else { Err(StoreError::NotFound("highlight")) };
        }

        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE user_highlighted_verses SET
                    note = COALESCE(NULLIF(?1, ''), note),
                    color = COALESCE(NULLIF(?2, ''), color),
                    updated_at = ?3
                 WHERE user_id = ?4 AND book_id = ?5 AND chapter = ?6 AND verse = ?7",
                params![note, color, Utc::now(), user_id, verse.book_id, verse.chapter, verse.verse],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("highlight"));
            }
            Ok(())
        })
    }

    fn remove_highlighted_verse(&self, user_id: i64, verse: VerseRef) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "DELETE FROM user_highlighted_verses
                 WHERE user_id = ?1 AND book_id = ?2 AND chapter = ?3 AND verse = ?4",
                params![user_id, verse.book_id, verse.chapter, verse.verse],
            )?;
            Ok(())
        })
    }

    // -- Last read --

    fn update_last_read(&self, user_id: i64, last_read: &NewLastRead) -> Result<LastReadRow> {
        self.with_conn_mut(|conn| {
            // Single statement: the UNIQUE(user_id) index arbitrates
            // concurrent writers for the same user.
            conn.execute(
                "INSERT INTO user_last_read (user_id, book_id, book_name, chapter, verse, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                    book_id = excluded.book_id,
                    book_name = excluded.book_name,
                    chapter = excluded.chapter,
                    verse = excluded.verse,
                    updated_at = excluded.updated_at",
                params![
                    user_id,
                    last_read.book_id,
                    last_read.book_name,
                    last_read.chapter,
                    last_read.verse,
                    Utc::now(),
                ],
            )
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::NotFound("user")
                } else {
                    e.into()
                }
            })?;

            let sql = format!("{LAST_READ_SELECT} WHERE l.user_id = ?1");
            Ok(conn.query_row(&sql, [user_id], last_read_from_row)?)
        })
    }

    fn get_last_read(&self, user_id: i64) -> Result<Option<LastReadRow>> {
        self.with_conn(|conn| {
            let sql = format!("{LAST_READ_SELECT} WHERE l.user_id = ?1");
            conn.query_row(&sql, [user_id], last_read_from_row).optional()
        })
    }

    fn get_last_read_verses(&self, user_id: i64) -> Result<Vec<LastReadRow>> {
        self.with_conn(|conn| {
            let sql = format!("{LAST_READ_SELECT} WHERE l.user_id = ?1 ORDER BY l.updated_at DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], last_read_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Insert failures on the per-user activity tables.
fn activity_write_error(e: rusqlite::Error, duplicate: &'static str) -> StoreError {
    if is_unique_violation(&e) {
        StoreError::Conflict(duplicate)
    } else if is_foreign_key_violation(&e) {
        StoreError::NotFound("user")
    } else {
        e.into()
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, filter: &str, value: P) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter}");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            age: row.get(5)?,
            believer_category: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    })
    .optional()
}

fn verse_from_row(row: &Row<'_>) -> rusqlite::Result<Verse> {
    Ok(Verse {
        book_id: row.get(0)?,
        book: row.get(1)?,
        chapter: row.get(2)?,
        verse: row.get(3)?,
        text: row.get(4)?,
    })
}

fn favorite_from_row(row: &Row<'_>) -> rusqlite::Result<FavoriteRow> {
    Ok(FavoriteRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        book_id: row.get(2)?,
        chapter: row.get(3)?,
        verse: row.get(4)?,
        book_name: row.get(5)?,
        text: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn highlight_from_row(row: &Row<'_>) -> rusqlite::Result<HighlightRow> {
    Ok(HighlightRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        book_id: row.get(2)?,
        chapter: row.get(3)?,
        verse: row.get(4)?,
        note: row.get(5)?,
        color: row.get(6)?,
        book_name: row.get(7)?,
        text: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn last_read_from_row(row: &Row<'_>) -> rusqlite::Result<LastReadRow> {
    Ok(LastReadRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        book_id: row.get(2)?,
        book_name: row.get(3)?,
        chapter: row.get(4)?,
        verse: row.get(5)?,
        text: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
