use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use lumen_db::Store;
use lumen_db::models::NewUser;
use lumen_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::explain::ExplainClient;
use crate::users::user_response;
use crate::{token, validation, with_store};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<dyn Store>,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub explainer: ExplainClient,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    validation::name("first_name", &req.first_name)?;
    validation::name("last_name", &req.last_name)?;
    validation::email(&req.email)?;
    if req.password.chars().count() < 6 {
        return Err(ApiError::validation("password", "password must be at least 6 characters"));
    }
    validation::range("age", req.age, 1, 150)?;
    validation::range("believer_category", req.believer_category, 1, 5)?;

    let new_user = NewUser {
        email: req.email.trim().to_lowercase(),
        password: req.password,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        age: req.age,
        believer_category: req.believer_category,
    };

    let user = with_store(&state, move |db| db.create_user(&new_user)).await?;
    let access = token::issue(&state.jwt_secret, user.id, state.token_ttl)?;

    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            access,
            user: user_response(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    validation::email(&req.email)?;
    if req.password.is_empty() {
        return Err(ApiError::validation("password", "password is required"));
    }

    let email = req.email.trim().to_lowercase();
    let user = with_store(&state, move |db| db.verify_password(&email, &req.password))
        .await
        .inspect_err(|e| {
            if matches!(e, ApiError::InvalidCredentials) {
                warn!("Failed login attempt");
            }
        })?;

    let access = token::issue(&state.jwt_secret, user.id, state.token_ttl)?;
    Ok(Json(LoginResponse { access }))
}
