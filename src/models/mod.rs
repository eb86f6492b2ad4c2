//! API and row models for the song catalog

pub mod favorite;
pub mod song;
pub mod user;

use serde::{Deserialize, Serialize};

pub use favorite::{Favorite, FavoriteDetails, NewFavorite};
pub use song::{NewSong, Song, SongCreate, SongFilter, SongUpdate, REQUIRED_SONG_FIELDS};
pub use user::{Registered, UserCreate, UserRecord};

/// Plain confirmation body: `{"message": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
