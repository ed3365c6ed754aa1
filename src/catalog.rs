use crate::ordering::FeatureRecord;
use anyhow::Result;

/// Largest number of ids accepted by one audio-features request
pub const FEATURE_BATCH_SIZE: usize = 100;
/// Page size used when listing playlist tracks
pub const TRACK_PAGE_SIZE: usize = 100;
/// Largest number of tracks appended to a playlist per request
pub const UPLOAD_BATCH_SIZE: usize = 50;

/// Descriptive data copied from the source playlist onto the reordered one
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistDetails {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub public: Option<bool>,
}

/// A playlist entry; `id` is `None` for local files and unavailable tracks
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRef {
    pub id: Option<String>,
    pub name: String,
}

/// One page of a playlist's track listing
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPage {
    pub tracks: Vec<TrackRef>,
    pub has_next: bool,
}

/// Operations the reorderer needs from the music catalog
#[cfg_attr(test, mockall::automock)]
pub trait CatalogService {
    /// Owner, name, description and visibility of a playlist
    fn playlist_details(&self, playlist_id: &str) -> Result<PlaylistDetails>;

    /// Tracks `offset..offset + limit` of a playlist
    fn playlist_tracks(&self, playlist_id: &str, offset: usize, limit: usize) -> Result<TrackPage>;

    /// Feature records for up to [`FEATURE_BATCH_SIZE`] track ids, in request order.
    /// Entries are `None` when the catalog has no analysis for that track.
    fn audio_features(&self, track_ids: &[String]) -> Result<Vec<Option<FeatureRecord>>>;

    /// Create an empty playlist owned by `user_id`, returning its id
    fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: Option<bool>,
        description: Option<String>,
    ) -> Result<String>;

    /// Insert track ids into a playlist starting at `position`
    fn add_tracks(&self, playlist_id: &str, track_ids: &[String], position: usize) -> Result<()>;
}
