//! Row types returned by the store. Distinct from the lumen-types wire
//! models so the persistence layer stays independent of the HTTP surface.
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub believer_category: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Registration input. `password` is plaintext; the store hashes it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub believer_category: i64,
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i64>,
    pub believer_category: Option<i64>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.age.is_none()
            && self.believer_category.is_none()
    }
}

/// A favorite joined with its verse. `book_name` and `text` are empty when
/// the reference has no verse row.
#[derive(Debug, Clone)]
pub struct FavoriteRow {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub chapter: i64,
    pub verse: i64,
    pub book_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HighlightRow {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub chapter: i64,
    pub verse: i64,
    pub note: String,
    pub color: String,
    pub book_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LastReadRow {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub book_name: String,
    pub chapter: i64,
    pub verse: i64,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLastRead {
    pub book_id: i64,
    pub book_name: String,
    pub chapter: i64,
    pub verse: i64,
}
