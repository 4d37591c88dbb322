use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};

use lumen_db::models::{LastReadRow, NewLastRead};
use lumen_types::api::{Claims, LastReadResponse, UpdateLastReadRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{validation, with_store};

fn last_read_response(row: LastReadRow) -> LastReadResponse {
    LastReadResponse {
        user_id: row.user_id,
        book_id: row.book_id,
        book_name: row.book_name,
        chapter: row.chapter,
        verse: row.verse,
        text: row.text,
        updated_at: row.updated_at,
    }
}

pub async fn set_last_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateLastReadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    validation::positive("book_id", req.book_id)?;
    validation::name("book_name", &req.book_name)?;
    validation::positive("chapter", req.chapter)?;
    validation::positive("verse", req.verse)?;

    let last_read = NewLastRead {
        book_id: req.book_id,
        book_name: req.book_name.trim().to_string(),
        chapter: req.chapter,
        verse: req.verse,
    };
    let row = with_store(&state, move |db| db.update_last_read(claims.sub, &last_read)).await?;

    Ok(Json(last_read_response(row)))
}

/// Responds with JSON `null` when nothing has been recorded yet.
pub async fn get_last_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = with_store(&state, move |db| db.get_last_read(claims.sub)).await?;
    Ok(Json(row.map(last_read_response)))
}

pub async fn list_last_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = with_store(&state, move |db| db.get_last_read_verses(claims.sub)).await?;
    Ok(Json(rows.into_iter().map(last_read_response).collect::<Vec<_>>()))
}
