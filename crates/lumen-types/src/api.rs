use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Claims carried by session tokens. `sub` is the numeric user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
}

// -- Health --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub age: i64,
    /// Older clients send this as `belif_rating`.
    #[serde(default, alias = "belif_rating")]
    pub believer_category: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub access: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
}

// -- Users --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub age: i64,
    pub believer_category: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i64>,
    pub believer_category: Option<i64>,
}

// -- Favorites / highlights / last read --

#[derive(Debug, Deserialize)]
pub struct AddFavoriteVerseRequest {
    #[serde(default)]
    pub book_id: i64,
    #[serde(default)]
    pub chapter: i64,
    #[serde(default)]
    pub verse: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddHighlightRequest {
    #[serde(default)]
    pub book_id: i64,
    #[serde(default)]
    pub chapter: i64,
    #[serde(default)]
    pub verse: i64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateHighlightRequest {
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLastReadRequest {
    #[serde(default)]
    pub book_id: i64,
    #[serde(default)]
    pub book_name: String,
    #[serde(default)]
    pub chapter: i64,
    #[serde(default)]
    pub verse: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteVerseResponse {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub book_name: String,
    pub chapter: i64,
    pub verse: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightedVerseResponse {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub book_name: String,
    pub chapter: i64,
    pub verse: i64,
    pub text: String,
    pub note: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LastReadResponse {
    pub user_id: i64,
    pub book_id: i64,
    pub book_name: String,
    pub chapter: i64,
    pub verse: i64,
    pub text: String,
    pub updated_at: DateTime<Utc>,
}

// -- Pagination --

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self { data, total, page, limit, total_pages }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// -- Scripture --

#[derive(Debug, Serialize, Deserialize)]
pub struct MaxChapterResponse {
    #[serde(rename = "MaxChapter")]
    pub max_chapter: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainRequest {
    #[serde(default)]
    pub book: String,
    #[serde(default)]
    pub chapter: i64,
    #[serde(default)]
    pub start_verse: i64,
    #[serde(default)]
    pub end_verse: i64,
    #[serde(default)]
    pub age: i64,
    #[serde(default)]
    pub belief: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explanation: String,
}
