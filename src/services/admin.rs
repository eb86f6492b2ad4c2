//! Admin operations: song management and user listing/deletion

use std::sync::Arc;

use tracing::instrument;

use crate::db::repository::{favorites, songs, users};
use crate::db::{Store, StoreError};
use crate::error::AppError;
use crate::metrics::record_write;
use crate::models::{Message, Song, SongCreate, SongFilter, SongUpdate, UserRecord, REQUIRED_SONG_FIELDS};

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Search songs; an empty result is not an error
    pub async fn search_songs(&self, filter: &SongFilter) -> Result<Vec<Song>, AppError> {
        songs::search(self.store.as_ref(), filter)
            .await
            .map_err(|e| AppError::server("Failed to search songs", e))
    }

    /// Create a song from a complete payload
    pub async fn create_song(&self, payload: SongCreate) -> Result<Song, AppError> {
        let new_song = payload.into_new_song().map_err(|missing| {
            AppError::validation(format!(
                "Missing required fields: {}. Required: {}",
                missing.join(", "),
                REQUIRED_SONG_FIELDS.join(", ")
            ))
        })?;

        match songs::insert(self.store.as_ref(), &new_song).await {
            Ok(song) => {
                record_write(songs::TABLE, "insert");
                tracing::info!(
                    "Admin: Created song {} ({} - {})",
                    song.id,
                    song.artist_name,
                    song.track_name
                );
                Ok(song)
            }
            Err(StoreError::NotNull(detail)) => {
                tracing::error!("Failed to create song: {}", detail);
                Err(AppError::validation("Database error: Required field missing"))
            }
            Err(e @ StoreError::Malformed(_)) => Err(AppError::server("Failed to create song", e)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create song");
                Err(AppError::Server(format!("Failed to create song: {}", e)))
            }
        }
    }

    /// Apply a partial update to an existing song
    #[instrument(skip(self, changes))]
    pub async fn update_song(&self, id: i64, changes: SongUpdate) -> Result<Message, AppError> {
        let context = "Failed to update song";
        let store = self.store.as_ref();

        let existing = songs::find_by_id(store, id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        if existing.is_none() {
            return Err(AppError::not_found("Song not found"));
        }

        if changes.is_empty() {
            return Err(AppError::validation("No update data provided"));
        }

        songs::update(store, id, &changes)
            .await
            .map_err(|e| AppError::server(context, e))?;
        record_write(songs::TABLE, "update");

        tracing::info!("Admin: Updated song {}", id);
        Ok(Message::new("Song updated"))
    }

    #[instrument(skip(self))]
    pub async fn delete_song(&self, id: i64) -> Result<Message, AppError> {
        let context = "Failed to delete song";
        let store = self.store.as_ref();

        let existing = songs::find_by_id(store, id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        if existing.is_none() {
            return Err(AppError::not_found("Song not found"));
        }

        songs::delete(store, id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        record_write(songs::TABLE, "delete");

        tracing::info!("Admin: Deleted song {}", id);
        Ok(Message::new("Song deleted"))
    }

    /// Every user row, passwords included
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, AppError> {
        users::list_all(self.store.as_ref())
            .await
            .map_err(|e| AppError::server("Failed to fetch users", e))
    }

    /// Delete a user's favorites, then the user.
    ///
    /// The two deletes are separate store calls; if the second fails the
    /// user remains with no favorites.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<Message, AppError> {
        let context = "Failed to delete user";
        let store = self.store.as_ref();

        let existing = users::find_by_id(store, id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        if existing.is_none() {
            return Err(AppError::not_found("User not found"));
        }

        let removed = favorites::delete_by_user(store, id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        record_write(favorites::TABLE, "delete");

        users::delete(store, id)
            .await
            .map_err(|e| AppError::server(context, e))?;
        record_write(users::TABLE, "delete");

        tracing::info!("Admin: Deleted user {} and {} favorites", id, removed);
        Ok(Message::new("User deleted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewFavorite, UserCreate};
    use crate::services::testing::FailingStore;

    fn payload(artist: &str, track: &str, track_id: &str, year: i32, genre: &str) -> SongCreate {
        SongCreate {
            artist_name: Some(artist.to_string()),
            track_name: Some(track.to_string()),
            track_id: Some(track_id.to_string()),
            year: Some(year),
            genre: Some(genre.to_string()),
        }
    }

    fn service() -> (AdminService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AdminService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_create_song_returns_input_fields() {
        let (admin, _) = service();
        let song = admin
            .create_song(payload("A", "B", "T1", 2020, "Pop"))
            .await
            .unwrap();

        assert_eq!(song.id, 1);
        assert_eq!(song.artist_name, "A");
        assert_eq!(song.track_name, "B");
        assert_eq!(song.track_id, "T1");
        assert_eq!(song.year, 2020);
        assert_eq!(song.genre, "Pop");
    }

    #[tokio::test]
    async fn test_create_song_missing_field_never_reaches_store() {
        let admin = AdminService::new(Arc::new(FailingStore::unreachable()));
        let mut incomplete = payload("A", "B", "T1", 2020, "Pop");
        incomplete.track_id = None;

        match admin.create_song(incomplete).await {
            Err(AppError::Validation(message)) => assert!(message.contains("track_id")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_song_store_errors() {
        let admin = AdminService::new(Arc::new(FailingStore::not_null()));
        let err = admin.create_song(payload("A", "B", "T1", 2020, "Pop")).await.unwrap_err();
        assert_eq!(err, AppError::validation("Database error: Required field missing"));

        let admin = AdminService::new(Arc::new(FailingStore::unreachable()));
        match admin.create_song(payload("A", "B", "T1", 2020, "Pop")).await {
            Err(AppError::Server(message)) => {
                assert!(message.starts_with("Failed to create song: "));
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected server error, got {:?}", other),
        }

        let admin = AdminService::new(Arc::new(FailingStore::malformed()));
        let err = admin.create_song(payload("A", "B", "T1", 2020, "Pop")).await.unwrap_err();
        assert_eq!(err, AppError::Server("Invalid server response".into()));
    }

    #[tokio::test]
    async fn test_search_songs_filters() {
        let (admin, _) = service();
        admin.create_song(payload("Queen", "Bohemian Rhapsody", "T1", 1975, "Rock")).await.unwrap();
        admin.create_song(payload("Queen", "Radio Ga Ga", "T2", 1984, "Rock")).await.unwrap();
        admin.create_song(payload("ABBA", "Waterloo", "T3", 1974, "Pop")).await.unwrap();

        let all = admin.search_songs(&SongFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let filter = SongFilter {
            artist_name: Some("quee".into()),
            year: Some(1984),
            ..Default::default()
        };
        let found = admin.search_songs(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].track_name, "Radio Ga Ga");

        let filter = SongFilter {
            genre: Some("Jazz".into()),
            ..Default::default()
        };
        assert!(admin.search_songs(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_songs_store_failures() {
        let admin = AdminService::new(Arc::new(FailingStore::unreachable()));
        let err = admin.search_songs(&SongFilter::default()).await.unwrap_err();
        assert_eq!(err, AppError::Server("Failed to search songs".into()));

        let admin = AdminService::new(Arc::new(FailingStore::malformed()));
        let err = admin.search_songs(&SongFilter::default()).await.unwrap_err();
        assert_eq!(err, AppError::Server("Invalid server response".into()));
    }

    #[tokio::test]
    async fn test_update_song() {
        let (admin, _) = service();
        let song = admin.create_song(payload("A", "B", "T1", 2020, "Pop")).await.unwrap();

        let changes = SongUpdate {
            genre: Some("Rock".into()),
            ..Default::default()
        };
        let message = admin.update_song(song.id, changes).await.unwrap();
        assert_eq!(message.message, "Song updated");

        let songs = admin.search_songs(&SongFilter::default()).await.unwrap();
        assert_eq!(songs[0].genre, "Rock");
        assert_eq!(songs[0].track_name, "B");
    }

    #[tokio::test]
    async fn test_update_song_checks_existence_before_payload() {
        let (admin, _) = service();
        let err = admin.update_song(42, SongUpdate::default()).await.unwrap_err();
        assert_eq!(err, AppError::not_found("Song not found"));

        let song = admin.create_song(payload("A", "B", "T1", 2020, "Pop")).await.unwrap();
        let err = admin.update_song(song.id, SongUpdate::default()).await.unwrap_err();
        assert_eq!(err, AppError::validation("No update data provided"));
    }

    #[tokio::test]
    async fn test_delete_song() {
        let (admin, _) = service();
        let song = admin.create_song(payload("A", "B", "T1", 2020, "Pop")).await.unwrap();

        assert_eq!(admin.delete_song(song.id).await.unwrap().message, "Song deleted");
        assert_eq!(
            admin.delete_song(song.id).await.unwrap_err(),
            AppError::not_found("Song not found")
        );
    }

    #[tokio::test]
    async fn test_delete_user_cascades_favorites() {
        let (admin, store) = service();
        let user = users::insert(
            &*store,
            &UserCreate {
                username: "alice".into(),
                password: "x".into(),
            },
        )
        .await
        .unwrap();
        let song = admin.create_song(payload("A", "B", "T1", 2020, "Pop")).await.unwrap();
        favorites::insert(
            &*store,
            &NewFavorite {
                user_id: user.id,
                song_id: song.id,
            },
        )
        .await
        .unwrap();

        assert_eq!(admin.list_users().await.unwrap().len(), 1);
        assert_eq!(admin.delete_user(user.id).await.unwrap().message, "User deleted");

        assert!(admin.list_users().await.unwrap().is_empty());
        assert!(favorites::list_by_user(&*store, user.id).await.unwrap().is_empty());
        assert_eq!(
            admin.delete_user(user.id).await.unwrap_err(),
            AppError::not_found("User not found")
        );
    }

    #[tokio::test]
    async fn test_list_users_exposes_passwords() {
        let (admin, store) = service();
        users::insert(
            &*store,
            &UserCreate {
                username: "bob".into(),
                password: "hunter2".into(),
            },
        )
        .await
        .unwrap();

        let listed = admin.list_users().await.unwrap();
        assert_eq!(listed[0].username, "bob");
        assert_eq!(listed[0].password, "hunter2");
    }
}
