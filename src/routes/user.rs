//! User endpoints: registration, song search and favorites

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::UserCreate;
use crate::AppState;

/// Query params for user song search
#[derive(Debug, Deserialize)]
pub struct NameSearchQuery {
    pub artist_name: Option<String>,
    pub track_name: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/register/", post(register))
        .route("/user/songs/", get(search_songs))
        .route("/user/favorites/:user_id", get(list_favorites))
        .route(
            "/user/favorites/:user_id/:song_id",
            post(add_favorite).delete(remove_favorite),
        )
}

/// POST /user/register/ - Register a new user
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserCreate>,
) -> Result<impl IntoResponse, AppError> {
    let registered = state.users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(registered)))
}

/// GET /user/songs/ - Search songs by artist or track name
pub async fn search_songs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameSearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let songs = state
        .users
        .search_songs(query.artist_name, query.track_name)
        .await?;
    Ok(Json(songs))
}

/// GET /user/favorites/:user_id - Favorite songs of a user
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let songs = state.users.list_favorites(user_id).await?;
    Ok(Json(songs))
}

/// POST /user/favorites/:user_id/:song_id - Add a song to favorites
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Path((user_id, song_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let message = state.users.add_favorite(user_id, song_id).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// DELETE /user/favorites/:user_id/:song_id - Remove a song from favorites
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Path((user_id, song_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let message = state.users.remove_favorite(user_id, song_id).await?;
    Ok(Json(message))
}
