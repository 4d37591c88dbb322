//! In-process [`Store`] used by handler tests. Mirrors the SQLite adapter's
//! constraints: unique email, one favorite/highlight per verse reference,
//! one last-read row per user, activity rows owned by an existing user,
//! cascading user deletes.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use lumen_types::models::{Book, Verse, VerseRef};

use crate::error::{Result, StoreError};
use crate::models::{FavoriteRow, HighlightRow, LastReadRow, NewLastRead, NewUser, UserRow, UserUpdate};
use crate::password;
use crate::store::{DEFAULT_HIGHLIGHT_COLOR, Store};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    verses: Vec<Verse>,
    users: Vec<UserRow>,
    favorites: Vec<Favorite>,
    highlights: Vec<Highlight>,
    last_reads: Vec<LastRead>,
    next_id: i64,
}

struct Favorite {
    id: i64,
    user_id: i64,
    verse: VerseRef,
    created_at: DateTime<Utc>,
}

struct Highlight {
    id: i64,
    user_id: i64,
    verse: VerseRef,
    note: String,
    color: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct LastRead {
    id: i64,
    user_id: i64,
    book_id: i64,
    book_name: String,
    chapter: i64,
    verse: i64,
    updated_at: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for tests that need scripture text.
    pub fn with_verses(verses: Vec<Verse>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.verses = verses;
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Stand-in for the foreign key on the activity tables.
    fn require_user(&self, user_id: i64) -> Result<()> {
        if self.users.iter().any(|u| u.id == user_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound("user"))
        }
    }

    fn verse(&self, r: VerseRef) -> Option<&Verse> {
        self.verses.iter().find(|v| r.matches(v))
    }

    fn favorite_row(&self, f: &Favorite) -> FavoriteRow {
        let verse = self.verse(f.verse);
        FavoriteRow {
            id: f.id,
            user_id: f.user_id,
            book_id: f.verse.book_id,
            chapter: f.verse.chapter,
            verse: f.verse.verse,
            book_name: verse.map(|v| v.book.clone()).unwrap_or_default(),
            text: verse.map(|v| v.text.clone()).unwrap_or_default(),
            created_at: f.created_at,
        }
    }

    fn highlight_row(&self, h: &Highlight) -> HighlightRow {
        let verse = self.verse(h.verse);
        HighlightRow {
            id: h.id,
            user_id: h.user_id,
            book_id: h.verse.book_id,
            chapter: h.verse.chapter,
            verse: h.verse.verse,
            note: h.note.clone(),
            color: h.color.clone(),
            book_name: verse.map(|v| v.book.clone()).unwrap_or_default(),
            text: verse.map(|v| v.text.clone()).unwrap_or_default(),
            created_at: h.created_at,
            updated_at: h.updated_at,
        }
    }

    fn last_read_row(&self, l: &LastRead) -> LastReadRow {
        let text = self
            .verse(VerseRef::new(l.book_id, l.chapter, l.verse))
            .map(|v| v.text.clone())
            .unwrap_or_default();
        LastReadRow {
            id: l.id,
            user_id: l.user_id,
            book_id: l.book_id,
            book_name: l.book_name.clone(),
            chapter: l.chapter,
            verse: l.verse,
            text,
            updated_at: l.updated_at,
        }
    }
}

/// Newest first with the id as tie-breaker, like the SQL adapter.
fn page<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K, limit: i64, offset: i64) -> Vec<T> {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

impl Store for MemoryStore {
    fn ready(&self) -> bool {
        self.lock().is_ok()
    }

    fn list_verses(&self) -> Result<Vec<Verse>> {
        let inner = self.lock()?;
        let mut verses = inner.verses.clone();
        verses.sort_by_key(|v| (v.book_id, v.chapter, v.verse));
        Ok(verses)
    }

    fn list_verses_by_chapter(&self, book_id: i64, chapter: i64) -> Result<Vec<Verse>> {
        let inner = self.lock()?;
        let mut verses: Vec<Verse> = inner
            .verses
            .iter()
            .filter(|v| v.book_id == book_id && v.chapter == chapter)
            .cloned()
            .collect();
        verses.sort_by_key(|v| v.verse);
        Ok(verses)
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        let inner = self.lock()?;
        let mut books: Vec<Book> = Vec::new();
        for v in &inner.verses {
            if !books.iter().any(|b| b.book_id == v.book_id && b.book == v.book) {
                books.push(Book {
                    book_id: v.book_id,
                    book: v.book.clone(),
                });
            }
        }
        books.sort_by_key(|b| b.book_id);
        Ok(books)
    }

    fn max_chapter(&self, book_id: i64) -> Result<Option<i64>> {
        let inner = self.lock()?;
        Ok(inner
            .verses
            .iter()
            .filter(|v| v.book_id == book_id)
            .map(|v| v.chapter)
            .max())
    }

    fn count_verses(&self) -> Result<i64> {
        Ok(self.lock()?.verses.len() as i64)
    }

    fn import_verses(&self, verses: &[Verse]) -> Result<usize> {
        let mut inner = self.lock()?;
        let mut inserted = 0;
        for v in verses {
            let key = VerseRef::new(v.book_id, v.chapter, v.verse);
            if inner.verse(key).is_none() {
                inner.verses.push(v.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn create_user(&self, user: &NewUser) -> Result<UserRow> {
        let password_hash = password::hash(&user.password)?;
        let mut inner = self.lock()?;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email already registered"));
        }
        let now = Utc::now();
        let row = UserRow {
            id: inner.next_id(),
            email: user.email.clone(),
            password_hash,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            age: user.age,
            believer_category: user.believer_category,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(row.clone());
        Ok(row)
    }

    fn get_user_by_id(&self, id: i64) -> Result<UserRow> {
        let inner = self.lock()?;
        inner
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("user"))
    }

    fn get_user_by_email(&self, email: &str) -> Result<UserRow> {
        let inner = self.lock()?;
        inner
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound("user"))
    }

    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<()> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound("user"))?;
        if let Some(first_name) = &update.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &update.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(age) = update.age {
            user.age = age;
        }
        if let Some(category) = update.believer_category {
            user.believer_category = category;
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    fn delete_user(&self, id: i64) -> Result<()> {
        let mut inner = self.lock()?;
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        if inner.users.len() == before {
            return Err(StoreError::NotFound("user"));
        }
        inner.favorites.retain(|f| f.user_id != id);
        inner.highlights.retain(|h| h.user_id != id);
        inner.last_reads.retain(|l| l.user_id != id);
        Ok(())
    }

    fn add_favorite_verse(&self, user_id: i64, verse: VerseRef) -> Result<FavoriteRow> {
        let mut inner = self.lock()?;
        inner.require_user(user_id)?;
        if inner.favorites.iter().any(|f| f.user_id == user_id && f.verse == verse) {
            return Err(StoreError::Conflict("verse already in favorites"));
        }
        let favorite = Favorite {
            id: inner.next_id(),
            user_id,
            verse,
            created_at: Utc::now(),
        };
        let row = inner.favorite_row(&favorite);
        inner.favorites.push(favorite);
        Ok(row)
    }

    fn get_favorite_verses(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<FavoriteRow>> {
        let inner = self.lock()?;
        let rows = inner
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| inner.favorite_row(f))
            .collect();
        Ok(page(rows, |r: &FavoriteRow| (r.created_at, r.id), limit, offset))
    }

    fn count_favorite_verses(&self, user_id: i64) -> Result<i64> {
        let inner = self.lock()?;
        Ok(inner.favorites.iter().filter(|f| f.user_id == user_id).count() as i64)
    }

    fn remove_favorite_verse(&self, user_id: i64, verse: VerseRef) -> Result<()> {
        let mut inner = self.lock()?;
        inner.favorites.retain(|f| !(f.user_id == user_id && f.verse == verse));
        Ok(())
    }

    fn is_favorite_verse(&self, user_id: i64, verse: VerseRef) -> Result<bool> {
        let inner = self.lock()?;
        Ok(inner.favorites.iter().any(|f| f.user_id == user_id && f.verse == verse))
    }

    fn add_highlighted_verse(
        &self,
        user_id: i64,
        verse: VerseRef,
        note: &str,
        color: &str,
    ) -> Result<HighlightRow> {
        let mut inner = self.lock()?;
        inner.require_user(user_id)?;
        if inner.highlights.iter().any(|h| h.user_id == user_id && h.verse == verse) {
            return Err(StoreError::Conflict("verse already highlighted"));
        }
        let now = Utc::now();
        let highlight = Highlight {
            id: inner.next_id(),
            user_id,
            verse,
            note: note.to_string(),
            color: (if color.is_empty() { DEFAULT_HIGHLIGHT_COLOR } else { color }).to_string(),
            created_at: now,
            updated_at: now,
        };
        let row = inner.highlight_row(&highlight);
        inner.highlights.push(highlight);
        Ok(row)
    }

    fn get_highlighted_verses(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<HighlightRow>> {
        let inner = self.lock()?;
        let rows = inner
            .highlights
            .iter()
            .filter(|h| h.user_id == user_id)
            .map(|h| inner.highlight_row(h))
            .collect();
        Ok(page(rows, |r: &HighlightRow| (r.updated_at, r.id), limit, offset))
    }

    fn count_highlighted_verses(&self, user_id: i64) -> Result<i64> {
        let inner = self.lock()?;
        Ok(inner.highlights.iter().filter(|h| h.user_id == user_id).count() as i64)
    }

    fn update_highlighted_verse(&self, user_id: i64, verse: VerseRef, note: &str, color: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let highlight = inner
            .highlights
            .iter_mut()
            .find(|h| h.user_id == user_id && h.verse == verse)
            .ok_or(StoreError::NotFound("highlight"))?;
        if note.is_empty() && color.is_empty() {
            return Ok(());
        }
        if !note.is_empty() {
            highlight.note = note.to_string();
        }
        if !color.is_empty() {
            highlight.color = color.to_string();
        }
        highlight.updated_at = Utc::now();
        Ok(())
    }

    fn remove_highlighted_verse(&self, user_id: i64, verse: VerseRef) -> Result<()> {
        let mut inner = self.lock()?;
        inner.highlights.retain(|h| !(h.user_id == user_id && h.verse == verse));
        Ok(())
    }

    fn update_last_read(&self, user_id: i64, last_read: &NewLastRead) -> Result<LastReadRow> {
        let mut inner = self.lock()?;
        inner.require_user(user_id)?;
        let now = Utc::now();
        let idx = match inner.last_reads.iter().position(|l| l.user_id == user_id) {
            Some(idx) => {
                let existing = &mut inner.last_reads[idx];
                existing.book_id = last_read.book_id;
                existing.book_name = last_read.book_name.clone();
                existing.chapter = last_read.chapter;
                existing.verse = last_read.verse;
                existing.updated_at = now;
                idx
            }
            None => {
                let id = inner.next_id();
                inner.last_reads.push(LastRead {
                    id,
                    user_id,
                    book_id: last_read.book_id,
                    book_name: last_read.book_name.clone(),
                    chapter: last_read.chapter,
                    verse: last_read.verse,
                    updated_at: now,
                });
                inner.last_reads.len() - 1
            }
        };
        Ok(inner.last_read_row(&inner.last_reads[idx]))
    }

    fn get_last_read(&self, user_id: i64) -> Result<Option<LastReadRow>> {
        let inner = self.lock()?;
        Ok(inner
            .last_reads
            .iter()
            .find(|l| l.user_id == user_id)
            .map(|l| inner.last_read_row(l)))
    }

    fn get_last_read_verses(&self, user_id: i64) -> Result<Vec<LastReadRow>> {
        Ok(self.get_last_read(user_id)?.into_iter().collect())
    }
}
