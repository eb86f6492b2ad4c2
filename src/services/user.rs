//! User operations: registration, song search and favorites

use std::collections::HashMap;
use std::sync::Arc;

use tracing::instrument;

use crate::db::repository::{favorites, songs, users};
use crate::db::{Store, StoreError};
use crate::error::AppError;
use crate::metrics::record_write;
use crate::models::{FavoriteDetails, Message, NewFavorite, Registered, Song, SongFilter, UserCreate};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a user with a plaintext password
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn register(&self, user: UserCreate) -> Result<Registered, AppError> {
        let context = "Failed to register user";
        let store = self.store.as_ref();

        let existing = users::find_by_username(store, &user.username)
            .await
            .map_err(|e| AppError::server(context, e))?;
        if existing.is_some() {
            return Err(AppError::validation("Username already exists"));
        }

        // A concurrent registration can slip past the lookup; the unique
        // constraint catches it here.
        let created = match users::insert(store, &user).await {
            Ok(created) => created,
            Err(StoreError::Unique(_)) => return Err(AppError::validation("Username already exists")),
            Err(e) => return Err(AppError::server(context, e)),
        };
        record_write(users::TABLE, "insert");

        tracing::info!("Registered user {} ({})", created.id, created.username);
        Ok(Registered {
            message: "User created successfully".to_string(),
            user_id: created.id,
        })
    }

    /// Search songs by artist and/or track name
    pub async fn search_songs(
        &self,
        artist_name: Option<String>,
        track_name: Option<String>,
    ) -> Result<Vec<Song>, AppError> {
        let filter = SongFilter::by_name(artist_name, track_name);
        songs::search(self.store.as_ref(), &filter)
            .await
            .map_err(|e| AppError::server("Failed to search songs", e))
    }

    /// Favorites of a user with their songs embedded, in favorite order.
    /// Favorites pointing at a song that no longer exists are skipped.
    #[instrument(skip(self))]
    pub async fn favorite_details(&self, user_id: i64) -> Result<Vec<FavoriteDetails>, AppError> {
        let context = "Failed to get favorite songs";
        let store = self.store.as_ref();

        let favorites = favorites::list_by_user(store, user_id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        if favorites.is_empty() {
            return Ok(Vec::new());
        }

        let song_ids: Vec<i64> = favorites.iter().map(|f| f.song_id).collect();
        let mut by_id: HashMap<i64, Song> = songs::find_by_ids(store, &song_ids)
            .await
            .map_err(|e| AppError::server(context, e))?
            .into_iter()
            .map(|song| (song.id, song))
            .collect();

        Ok(favorites
            .into_iter()
            .filter_map(|favorite| {
                let song = by_id.remove(&favorite.song_id)?;
                Some(FavoriteDetails::new(favorite, song))
            })
            .collect())
    }

    /// Favorite songs of a user; empty when there are none
    pub async fn list_favorites(&self, user_id: i64) -> Result<Vec<Song>, AppError> {
        let details = self.favorite_details(user_id).await?;
        Ok(details.into_iter().map(|d| d.song_details).collect())
    }

    #[instrument(skip(self))]
    pub async fn add_favorite(&self, user_id: i64, song_id: i64) -> Result<Message, AppError> {
        let context = "Failed to add favorite song";
        let store = self.store.as_ref();

        let song = songs::find_by_id(store, song_id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        if song.is_none() {
            return Err(AppError::not_found("Song not found"));
        }

        let user = users::find_by_id(store, user_id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        if user.is_none() {
            return Err(AppError::not_found("User not found"));
        }

        let existing = favorites::find(store, user_id, song_id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        if existing.is_some() {
            return Err(AppError::validation("Song already in favorites"));
        }

        let favorite = NewFavorite { user_id, song_id };
        match favorites::insert(store, &favorite).await {
            Ok(_) => {}
            Err(StoreError::Unique(_)) => return Err(AppError::validation("Song already in favorites")),
            Err(e) => return Err(AppError::server(context, e)),
        }
        record_write(favorites::TABLE, "insert");

        tracing::info!("User {} added song {} to favorites", user_id, song_id);
        Ok(Message::new("Song added to favorites"))
    }

    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, user_id: i64, song_id: i64) -> Result<Message, AppError> {
        let context = "Failed to remove favorite song";
        let store = self.store.as_ref();

        let existing = favorites::find(store, user_id, song_id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        if existing.is_none() {
            return Err(AppError::not_found("Favorite not found"));
        }

        favorites::delete(store, user_id, song_id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        record_write(favorites::TABLE, "delete");

        tracing::info!("User {} removed song {} from favorites", user_id, song_id);
        Ok(Message::new("Song removed from favorites"))
    }
}
