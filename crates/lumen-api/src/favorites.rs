use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};

use lumen_db::models::FavoriteRow;
use lumen_types::api::{
    AddFavoriteVerseRequest, Claims, FavoriteVerseResponse, MessageResponse, PageQuery, Paginated,
};
use lumen_types::models::VerseRef;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{validation, with_store};

fn favorite_response(row: FavoriteRow) -> FavoriteVerseResponse {
    FavoriteVerseResponse {
        id: row.id,
        user_id: row.user_id,
        book_id: row.book_id,
        book_name: row.book_name,
        chapter: row.chapter,
        verse: row.verse,
        text: row.text,
        created_at: row.created_at,
    }
}

/// Parse and check a `{book_id}/{chapter}/{verse}` path triple.
pub(crate) fn verse_ref_from_path(raw: &(String, String, String)) -> Result<VerseRef, ApiError> {
    let book_id = validation::path_id("book_id", &raw.0)?;
    let chapter = validation::path_id("chapter", &raw.1)?;
    let verse = validation::path_id("verse", &raw.2)?;
    validation::positive("book_id", book_id)?;
    validation::positive("chapter", chapter)?;
    validation::positive("verse", verse)?;
    Ok(VerseRef::new(book_id, chapter, verse))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<AddFavoriteVerseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    validation::positive("book_id", req.book_id)?;
    validation::positive("chapter", req.chapter)?;
    validation::positive("verse", req.verse)?;

    let verse = VerseRef::new(req.book_id, req.chapter, req.verse);
    let row = with_store(&state, move |db| db.add_favorite_verse(claims.sub, verse)).await?;

    Ok((StatusCode::CREATED, Json(favorite_response(row))))
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let (page, limit, offset) = validation::pagination(query.page, query.limit)?;

    let (rows, total) = with_store(&state, move |db| {
        let rows = db.get_favorite_verses(claims.sub, limit, offset)?;
        let total = db.count_favorite_verses(claims.sub)?;
        Ok((rows, total))
    })
    .await?;

    let data = rows.into_iter().map(favorite_response).collect();
    Ok(Json(Paginated::new(data, total, page, limit)))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let verse = verse_ref_from_path(&raw)?;
    with_store(&state, move |db| db.remove_favorite_verse(claims.sub, verse)).await?;

    Ok(Json(MessageResponse {
        message: "verse removed from favorites".into(),
    }))
}
