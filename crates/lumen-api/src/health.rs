use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use lumen_types::api::HealthResponse;

use crate::auth::AppState;

pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.db.clone();
    let ready = tokio::task::spawn_blocking(move || db.ready())
        .await
        .unwrap_or(false);

    if ready {
        (StatusCode::OK, Json(HealthResponse { status: "OK".into() }))
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthResponse {
                status: "Failure".into(),
            }),
        )
    }
}

pub async fn liveness() -> impl IntoResponse {
    Json(HealthResponse { status: "OK".into() })
}
