use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::info;

use lumen_db::models::{UserRow, UserUpdate};
use lumen_types::api::{Claims, MessageResponse, UpdateUserRequest, UserResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{validation, with_store};

pub fn user_response(user: &UserRow) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        name: user.full_name(),
        age: user.age,
        believer_category: user.believer_category,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = with_store(&state, move |db| db.get_user_by_id(claims.sub)).await?;
    Ok(Json(user_response(&user)))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    if let Some(first_name) = &req.first_name {
        validation::name("first_name", first_name)?;
    }
    if let Some(last_name) = &req.last_name {
        validation::name("last_name", last_name)?;
    }
    if let Some(age) = req.age {
        validation::range("age", age, 1, 150)?;
    }
    if let Some(category) = req.believer_category {
        validation::range("believer_category", category, 1, 5)?;
    }

    let update = UserUpdate {
        first_name: req.first_name.map(|s| s.trim().to_string()),
        last_name: req.last_name.map(|s| s.trim().to_string()),
        age: req.age,
        believer_category: req.believer_category,
    };
    if update.is_empty() {
        return Err(ApiError::validation("body", "no fields to update"));
    }

    let user = with_store(&state, move |db| {
        db.update_user(claims.sub, &update)?;
        db.get_user_by_id(claims.sub)
    })
    .await?;

    Ok(Json(user_response(&user)))
}

pub async fn delete_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    with_store(&state, move |db| db.delete_user(claims.sub)).await?;
    info!("Deleted user {}", claims.sub);

    Ok(Json(MessageResponse {
        message: "account deleted".into(),
    }))
}
