use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
    response::IntoResponse,
};
use tracing::debug;

use lumen_types::api::{ExplainRequest, ExplainResponse, MaxChapterResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::explain::ExplainParams;
use crate::{token, validation, with_store};

const DEFAULT_AGE: i64 = 25;
const DEFAULT_BELIEF: i64 = 3;

pub async fn list_verses(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let verses = with_store(&state, |db| db.list_verses()).await?;
    Ok(Json(verses))
}

pub async fn list_chapter_verses(
    State(state): State<AppState>,
    Path((book_id, chapter)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let book_id = validation::path_id("book_id", &book_id)?;
    let chapter = validation::path_id("chapter", &chapter)?;

    let verses = with_store(&state, move |db| db.list_verses_by_chapter(book_id, chapter)).await?;
    Ok(Json(verses))
}

pub async fn list_books(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let books = with_store(&state, |db| db.list_books()).await?;
    Ok(Json(books))
}

pub async fn max_chapter(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let book_id = validation::path_id("book_id", &book_id)?;
    let max_chapter = with_store(&state, move |db| db.max_chapter(book_id)).await?;
    Ok(Json(MaxChapterResponse { max_chapter }))
}

/// Explain a verse range. A valid bearer token swaps the requested age and
/// belief for the caller's stored profile; any auth problem is ignored.
pub async fn explain_verse(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(mut req) = payload.map_err(|e| {
        debug!("Explain body rejected: {}", e.body_text());
        ApiError::validation("body", "Invalid request parameters")
    })?;

    if req.book.trim().is_empty() {
        return Err(ApiError::validation("book", "Invalid request parameters: book is required"));
    }
    if req.chapter < 1 {
        return Err(ApiError::validation("chapter", "Invalid request parameters: chapter must be at least 1"));
    }
    if req.start_verse < 1 {
        return Err(ApiError::validation(
            "start_verse",
            "Invalid request parameters: start_verse must be at least 1",
        ));
    }
    if req.end_verse < req.start_verse {
        return Err(ApiError::validation(
            "end_verse",
            "Invalid request parameters: end_verse must not precede start_verse",
        ));
    }

    apply_profile(&state, &headers, &mut req).await;

    if req.age == 0 {
        req.age = DEFAULT_AGE;
    }
    if req.belief == 0 {
        req.belief = DEFAULT_BELIEF;
    }

    let params = ExplainParams {
        book: req.book.trim().to_string(),
        chapter: req.chapter,
        start_verse: req.start_verse,
        end_verse: req.end_verse,
        age: req.age,
        belief: req.belief,
    };
    let explanation = state.explainer.explain(&params).await?;

    Ok(Json(ExplainResponse { explanation }))
}

/// Best-effort enrichment from the caller's profile. Never fails.
async fn apply_profile(state: &AppState, headers: &HeaderMap, req: &mut ExplainRequest) {
    let Some(raw) = token::bearer(headers) else {
        return;
    };
    let claims = match token::validate(&state.jwt_secret, raw) {
        Ok(claims) => claims,
        Err(_) => {
            debug!("Ignoring invalid token on explain request");
            return;
        }
    };
    match with_store(state, move |db| db.get_user_by_id(claims.sub)).await {
        Ok(user) => {
            req.age = user.age;
            req.belief = user.believer_category;
        }
        Err(e) => debug!("No profile for explain request: {}", e),
    }
}
