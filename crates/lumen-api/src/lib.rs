pub mod auth;
pub mod error;
pub mod explain;
pub mod favorites;
pub mod health;
pub mod highlights;
pub mod last_read;
pub mod middleware;
pub mod router;
pub mod scripture;
pub mod token;
pub mod users;
pub mod validation;


use lumen_db::Store;

use crate::auth::AppState;
use crate::error::ApiError;

pub use router::router;

/// Run a blocking store call off the async runtime. If the caller is
/// cancelled the result is dropped.
pub(crate) async fn with_store<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn Store) -> lumen_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || f(db.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("spawn_blocking join error: {e}")))?
        .map_err(ApiError::from)
}
