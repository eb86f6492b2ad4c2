use serde::{Deserialize, Serialize};

use super::Song;

/// Favorite row linking a user to a song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub song_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFavorite {
    pub user_id: i64,
    pub song_id: i64,
}

/// Favorite with the referenced song embedded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteDetails {
    pub id: i64,
    pub user_id: i64,
    pub song_id: i64,
    pub song_details: Song,
}

impl FavoriteDetails {
    pub fn new(favorite: Favorite, song: Song) -> Self {
        Self {
            id: favorite.id,
            user_id: favorite.user_id,
            song_id: favorite.song_id,
            song_details: song,
        }
    }
}
