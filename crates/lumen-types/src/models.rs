use serde::{Deserialize, Serialize};

/// One row of the scripture table. Reference data, loaded once and never
/// written by request handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub book_id: i64,
    pub book: String,
    pub chapter: i64,
    pub verse: i64,
    pub text: String,
}

/// Distinct (book id, name) projection of [`Verse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: i64,
    pub book: String,
}

/// The triple identifying a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRef {
    pub book_id: i64,
    pub chapter: i64,
    pub verse: i64,
}

impl VerseRef {
    pub fn new(book_id: i64, chapter: i64, verse: i64) -> Self {
        Self { book_id, chapter, verse }
    }

    pub fn matches(&self, verse: &Verse) -> bool {
        self.book_id == verse.book_id && self.chapter == verse.chapter && self.verse == verse.verse
    }
}
