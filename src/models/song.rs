use serde::{Deserialize, Serialize};

/// Columns a song must carry on creation
pub const REQUIRED_SONG_FIELDS: [&str; 5] = ["artist_name", "track_name", "track_id", "year", "genre"];

/// Song as stored and returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub artist_name: String,
    pub track_name: String,
    pub track_id: String,
    pub year: i32,
    pub genre: String,
}

/// Create request body
///
/// Every field is optional at this layer so that a missing one is reported
/// as a validation error instead of a body rejection. Unknown fields,
/// including a client-supplied `id`, are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongCreate {
    pub artist_name: Option<String>,
    pub track_name: Option<String>,
    pub track_id: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

impl SongCreate {
    /// Convert into an insertable song, or return the names of absent fields
    pub fn into_new_song(self) -> Result<NewSong, Vec<&'static str>> {
        match (self.artist_name, self.track_name, self.track_id, self.year, self.genre) {
            (Some(artist_name), Some(track_name), Some(track_id), Some(year), Some(genre)) => {
                Ok(NewSong {
                    artist_name,
                    track_name,
                    track_id,
                    year,
                    genre,
                })
            }
            (artist_name, track_name, track_id, year, genre) => {
                let present = [
                    artist_name.is_some(),
                    track_name.is_some(),
                    track_id.is_some(),
                    year.is_some(),
                    genre.is_some(),
                ];
                Err(REQUIRED_SONG_FIELDS
                    .iter()
                    .zip(present)
                    .filter(|(_, present)| !present)
                    .map(|(field, _)| *field)
                    .collect())
            }
        }
    }
}

/// Insert payload for the songs table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSong {
    pub artist_name: String,
    pub track_name: String,
    pub track_id: String,
    pub year: i32,
    pub genre: String,
}

/// Partial update body; absent and `null` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl SongUpdate {
    pub fn is_empty(&self) -> bool {
        self.artist_name.is_none()
            && self.track_name.is_none()
            && self.track_id.is_none()
            && self.year.is_none()
            && self.genre.is_none()
    }
}

/// Search filters; names match by case-insensitive substring, year and
/// genre exactly. Empty strings and a zero year count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongFilter {
    pub artist_name: Option<String>,
    pub track_name: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

impl SongFilter {
    /// Filter restricted to the two name fields
    pub fn by_name(artist_name: Option<String>, track_name: Option<String>) -> Self {
        Self {
            artist_name,
            track_name,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_create_payload() {
        let payload: SongCreate = serde_json::from_value(json!({
            "id": 99,
            "artist_name": "A",
            "track_name": "B",
            "track_id": "T1",
            "year": 2020,
            "genre": "Pop"
        }))
        .unwrap();

        let song = payload.into_new_song().unwrap();
        assert_eq!(song.track_id, "T1");
        assert_eq!(song.year, 2020);

        let row = serde_json::to_value(&song).unwrap();
        assert!(row.get("id").is_none());
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let payload: SongCreate = serde_json::from_value(json!({
            "artist_name": "A",
            "year": 2020
        }))
        .unwrap();

        assert_eq!(
            payload.into_new_song().unwrap_err(),
            vec!["track_name", "track_id", "genre"]
        );
    }

    #[test]
    fn test_update_serializes_only_supplied_fields() {
        let update: SongUpdate = serde_json::from_value(json!({ "genre": "Jazz", "year": null })).unwrap();
        assert!(!update.is_empty());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "genre": "Jazz" }));

        assert!(SongUpdate::default().is_empty());
    }
}
