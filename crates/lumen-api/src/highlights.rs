use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};

use lumen_db::models::HighlightRow;
use lumen_types::api::{
    AddHighlightRequest, Claims, HighlightedVerseResponse, MessageResponse, PageQuery, Paginated,
    UpdateHighlightRequest,
};
use lumen_types::models::VerseRef;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::favorites::verse_ref_from_path;
use crate::{validation, with_store};

const MAX_COLOR_LEN: usize = 20;

fn highlight_response(row: HighlightRow) -> HighlightedVerseResponse {
    HighlightedVerseResponse {
        id: row.id,
        user_id: row.user_id,
        book_id: row.book_id,
        book_name: row.book_name,
        chapter: row.chapter,
        verse: row.verse,
        text: row.text,
        note: row.note,
        color: row.color,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn check_color(color: &str) -> Result<(), ApiError> {
    if color.chars().count() > MAX_COLOR_LEN {
        return Err(ApiError::validation(
            "color",
            format!("color must be at most {MAX_COLOR_LEN} characters"),
        ));
    }
    Ok(())
}

pub async fn add_highlight(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<AddHighlightRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    validation::positive("book_id", req.book_id)?;
    validation::positive("chapter", req.chapter)?;
    validation::positive("verse", req.verse)?;
    check_color(&req.color)?;

    let verse = VerseRef::new(req.book_id, req.chapter, req.verse);
    let row = with_store(&state, move |db| {
        db.add_highlighted_verse(claims.sub, verse, &req.note, &req.color)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(highlight_response(row))))
}

pub async fn list_highlights(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let (page, limit, offset) = validation::pagination(query.page, query.limit)?;

    let (rows, total) = with_store(&state, move |db| {
        let rows = db.get_highlighted_verses(claims.sub, limit, offset)?;
        let total = db.count_highlighted_verses(claims.sub)?;
        Ok((rows, total))
    })
    .await?;

    let data = rows.into_iter().map(highlight_response).collect();
    Ok(Json(Paginated::new(data, total, page, limit)))
}

pub async fn update_highlight(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw): Path<(String, String, String)>,
    payload: Result<Json<UpdateHighlightRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let verse = verse_ref_from_path(&raw)?;
    let Json(req) = payload?;
    if req.note.is_empty() && req.color.is_empty() {
        return Err(ApiError::validation("body", "note or color is required"));
    }
    check_color(&req.color)?;

    with_store(&state, move |db| {
        db.update_highlighted_verse(claims.sub, verse, &req.note, &req.color)
    })
    .await?;

    Ok(Json(MessageResponse {
        message: "highlight updated".into(),
    }))
}

pub async fn remove_highlight(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let verse = verse_ref_from_path(&raw)?;
    with_store(&state, move |db| db.remove_highlighted_verse(claims.sub, verse)).await?;

    Ok(Json(MessageResponse {
        message: "highlight removed".into(),
    }))
}
