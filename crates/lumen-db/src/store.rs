//! The persistence seam. Handlers depend on [`Store`], never on a concrete
//! backend: [`crate::Database`] is the SQLite adapter and
//! [`crate::MemoryStore`] keeps everything in process for tests.
//!
//! Methods are blocking. Async callers run them on the blocking pool.

use lumen_types::models::{Book, Verse, VerseRef};

use crate::error::{Result, StoreError};
use crate::models::{FavoriteRow, HighlightRow, LastReadRow, NewLastRead, NewUser, UserRow, UserUpdate};
use crate::password;

pub const DEFAULT_HIGHLIGHT_COLOR: &str = "yellow";

pub trait Store: Send + Sync {
    /// Connectivity probe.
    fn ready(&self) -> bool;

    // -- Scripture --

    fn list_verses(&self) -> Result<Vec<Verse>>;

    /// Verses of one chapter, ordered by verse number. Empty when nothing matches.
    fn list_verses_by_chapter(&self, book_id: i64, chapter: i64) -> Result<Vec<Verse>>;

    fn list_books(&self) -> Result<Vec<Book>>;

    /// Highest chapter number of a book, `None` for an unknown book.
    fn max_chapter(&self, book_id: i64) -> Result<Option<i64>>;

    fn count_verses(&self) -> Result<i64>;

    /// Bulk-load reference text. Rows whose key already exists are skipped.
    /// Returns the number of rows inserted.
    fn import_verses(&self, verses: &[Verse]) -> Result<usize>;

    // -- Users --

    /// Hashes `user.password` and inserts. Fails with `Conflict` on a taken email.
    fn create_user(&self, user: &NewUser) -> Result<UserRow>;

    fn get_user_by_id(&self, id: i64) -> Result<UserRow>;

    fn get_user_by_email(&self, email: &str) -> Result<UserRow>;

    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<()>;

    /// Removes the user and everything they own.
    fn delete_user(&self, id: i64) -> Result<()>;

    /// Look up by email and compare hashes. Either miss yields
    /// `InvalidCredentials`.
    fn verify_password(&self, email: &str, password: &str) -> Result<UserRow> {
        let user = match self.get_user_by_email(email) {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => return Err(StoreError::InvalidCredentials),
            Err(e) => return Err(e),
        };
        if password::verify(password, &user.password_hash) {
            Ok(user)
        } else {
            Err(StoreError::InvalidCredentials)
        }
    }

    // -- Favorites --

    fn add_favorite_verse(&self, user_id: i64, verse: VerseRef) -> Result<FavoriteRow>;

    /// Newest first.
    fn get_favorite_verses(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<FavoriteRow>>;

    fn count_favorite_verses(&self, user_id: i64) -> Result<i64>;

    /// Idempotent.
    fn remove_favorite_verse(&self, user_id: i64, verse: VerseRef) -> Result<()>;

    fn is_favorite_verse(&self, user_id: i64, verse: VerseRef) -> Result<bool>;

    // -- Highlights --

    /// An empty `color` stores [`DEFAULT_HIGHLIGHT_COLOR`].
    fn add_highlighted_verse(
        &self,
        user_id: i64,
        verse: VerseRef,
        note: &str,
        color: &str,
    ) -> Result<HighlightRow>;

    /// Most recently updated first.
    fn get_highlighted_verses(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<HighlightRow>>;

    fn count_highlighted_verses(&self, user_id: i64) -> Result<i64>;

    /// Empty strings leave the column unchanged; both empty is a no-op.
    /// `NotFound` whenever no highlight exists for the reference.
    fn update_highlighted_verse(&self, user_id: i64, verse: VerseRef, note: &str, color: &str) -> Result<()>;

    /// Idempotent.
    fn remove_highlighted_verse(&self, user_id: i64, verse: VerseRef) -> Result<()>;

    // -- Last read --

    /// Insert-or-update keyed on the user id.
    fn update_last_read(&self, user_id: i64, last_read: &NewLastRead) -> Result<LastReadRow>;

    fn get_last_read(&self, user_id: i64) -> Result<Option<LastReadRow>>;

    fn get_last_read_verses(&self, user_id: i64) -> Result<Vec<LastReadRow>>;
}
