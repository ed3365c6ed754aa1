use serde::{Deserialize, Serialize};

use crate::catalog::{PlaylistDetails, TrackRef};
use crate::ordering::{Feature, FeatureRecord};

/// Response body of `GET /playlists/{id}` (only the fields we read)
#[derive(Debug, Deserialize)]
pub struct PlaylistResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub public: Option<bool>,
    pub owner: Owner,
}

#[derive(Debug, Deserialize)]
pub struct Owner {
    pub id: String,
}

impl From<PlaylistResponse> for PlaylistDetails {
    fn from(playlist: PlaylistResponse) -> Self {
        PlaylistDetails {
            owner_id: playlist.owner.id,
            name: playlist.name,
            // the catalog sends "" rather than null for a missing description
            description: playlist.description.filter(|d| !d.is_empty()),
            public: playlist.public,
        }
    }
}

/// Generic paging envelope used by list endpoints
#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub offset: Option<u32>,
    pub total: Option<u32>,
}

/// One entry of a playlist's track listing
#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<TrackObject>,
    #[serde(default)]
    pub is_local: bool,
}

#[derive(Debug, Deserialize)]
pub struct TrackObject {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl From<PlaylistItem> for TrackRef {
    fn from(item: PlaylistItem) -> Self {
        match item.track {
            Some(track) => TrackRef {
                // local files carry a placeholder id that cannot be looked up
                id: if item.is_local { None } else { track.id },
                name: track.name,
            },
            None => TrackRef {
                id: None,
                name: "Unavailable track".to_string(),
            },
        }
    }
}

/// Response body of `GET /audio-features`
#[derive(Debug, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeatures>>,
}

/// Audio analysis summary for one track
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    pub acousticness: Option<f64>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub loudness: Option<f64>,
    pub mode: Option<f64>,
    pub speechiness: Option<f64>,
    pub valence: Option<f64>,
}

impl AudioFeatures {
    pub fn value(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Acousticness => self.acousticness,
            Feature::Danceability => self.danceability,
            Feature::Energy => self.energy,
            Feature::Instrumentalness => self.instrumentalness,
            Feature::Liveness => self.liveness,
            Feature::Loudness => self.loudness,
            Feature::Mode => self.mode,
            Feature::Speechiness => self.speechiness,
            Feature::Valence => self.valence,
        }
    }
}

impl From<AudioFeatures> for FeatureRecord {
    /// Fields absent from the payload stay absent so the ordering core can report them
    fn from(features: AudioFeatures) -> Self {
        Feature::ALL
            .into_iter()
            .fold(FeatureRecord::new(features.id.clone()), |record, feature| {
                match features.value(feature) {
                    Some(value) => record.with(feature, value),
                    None => record,
                }
            })
    }
}

/// Request body of `POST /users/{user_id}/playlists`
#[derive(Debug, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
}

/// Request body of `POST /playlists/{id}/tracks`
#[derive(Debug, Serialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
    pub position: usize,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

/// Error envelope returned by the Web API on failure
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub status: u16,
    pub message: String,
}

/// Response body of the accounts service token endpoint
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}
