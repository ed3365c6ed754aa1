use crate::catalog::{
    CatalogService, FEATURE_BATCH_SIZE, PlaylistDetails, TRACK_PAGE_SIZE, TrackRef,
    UPLOAD_BATCH_SIZE,
};
use crate::ordering::{FeatureRecord, Tour, TrackOrderer};
use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};

/// Default text appended to the source playlist's name
pub const DEFAULT_NAME_SUFFIX: &str = " (Copy)";

/// A track in its new position
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedTrack {
    pub id: String,
    pub name: String,
}

/// Result of reordering a playlist, before anything is written back
#[derive(Debug, Clone)]
pub struct TrackOrdering {
    pub details: PlaylistDetails,
    pub tracks: Vec<OrderedTrack>,
    pub path_length: f64,
    pub skipped: usize,
}

impl TrackOrdering {
    pub fn track_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|track| track.id.clone()).collect()
    }
}

/// Fetches a playlist, orders it by audio similarity and writes the copy
pub struct PlaylistReorderer<C: CatalogService> {
    catalog: C,
    orderer: TrackOrderer,
    name_suffix: String,
}

impl<C: CatalogService> PlaylistReorderer<C> {
    pub fn new(catalog: C, orderer: TrackOrderer) -> Self {
        Self {
            catalog,
            orderer,
            name_suffix: DEFAULT_NAME_SUFFIX.to_string(),
        }
    }

    pub fn with_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.name_suffix = suffix.into();
        self
    }

    /// Fetch the playlist and its audio features, then compute the new order
    pub fn generate_track_ordering(&self, playlist_id: &str) -> Result<TrackOrdering> {
        let details = self
            .catalog
            .playlist_details(playlist_id)
            .with_context(|| format!("Failed to fetch playlist '{playlist_id}'"))?;
        info!("Reordering playlist '{}' owned by {}", details.name, details.owner_id);

        let listing = self.fetch_all_tracks(playlist_id)?;
        let listed = listing.len();
        let tracks: Vec<OrderedTrack> = listing
            .into_iter()
            .filter_map(|track| match track.id {
                Some(id) => Some(OrderedTrack { id, name: track.name }),
                None => {
                    warn!("Skipping '{}': it has no catalog id (local file?)", track.name);
                    None
                }
            })
            .collect();
        let skipped = listed - tracks.len();

        if tracks.is_empty() {
            return Err(anyhow!("Playlist '{}' has no orderable tracks", details.name));
        }

        let records = self.fetch_features(&tracks)?;
        let tour = self
            .orderer
            .order(&records)
            .context("Failed to compute track ordering")?;

        Ok(TrackOrdering {
            details,
            tracks: Self::project(tracks, &tour),
            path_length: tour.length,
            skipped,
        })
    }

    /// Name given to the reordered copy of `details`
    pub fn copy_name(&self, details: &PlaylistDetails) -> String {
        format!("{}{}", details.name, self.name_suffix)
    }

    /// Create the reordered copy and fill it in batches, returning its id
    pub fn upload(&self, details: &PlaylistDetails, track_ids: &[String]) -> Result<String> {
        let name = self.copy_name(details);
        let playlist_id = self
            .catalog
            .create_playlist(
                &details.owner_id,
                &name,
                details.public,
                details.description.clone(),
            )
            .with_context(|| format!("Failed to create playlist '{name}'"))?;
        info!("Created playlist '{name}' ({playlist_id})");

        for (index, batch) in track_ids.chunks(UPLOAD_BATCH_SIZE).enumerate() {
            let position = index * UPLOAD_BATCH_SIZE;
            debug!("Adding {} tracks at position {}", batch.len(), position);
            self.catalog
                .add_tracks(&playlist_id, batch, position)
                .with_context(|| format!("Failed to add tracks at position {position}"))?;
        }

        Ok(playlist_id)
    }

    fn fetch_all_tracks(&self, playlist_id: &str) -> Result<Vec<TrackRef>> {
        let mut tracks = Vec::new();
        loop {
            let page = self
                .catalog
                .playlist_tracks(playlist_id, tracks.len(), TRACK_PAGE_SIZE)
                .with_context(|| format!("Failed to list tracks at offset {}", tracks.len()))?;
            let received = page.tracks.len();
            tracks.extend(page.tracks);
            debug!("Fetched {} tracks (total: {})", received, tracks.len());

            // An empty page with a next link would loop forever
            if !page.has_next || received == 0 {
                break;
            }
        }
        Ok(tracks)
    }

    fn fetch_features(&self, tracks: &[OrderedTrack]) -> Result<Vec<FeatureRecord>> {
        let mut records = Vec::with_capacity(tracks.len());

        for batch in tracks.chunks(FEATURE_BATCH_SIZE) {
            let ids: Vec<String> = batch.iter().map(|track| track.id.clone()).collect();
            let features = self
                .catalog
                .audio_features(&ids)
                .context("Failed to fetch audio features")?;

            if features.len() != batch.len() {
                return Err(anyhow!(
                    "Requested audio features for {} tracks but received {}",
                    batch.len(),
                    features.len()
                ));
            }

            for (track, record) in batch.iter().zip(features) {
                let record = record.ok_or_else(|| {
                    anyhow!("No audio features available for '{}' ({})", track.name, track.id)
                })?;
                records.push(record);
            }
        }

        Ok(records)
    }

    fn project(tracks: Vec<OrderedTrack>, tour: &Tour) -> Vec<OrderedTrack> {
        let mut slots: Vec<Option<OrderedTrack>> = tracks.into_iter().map(Some).collect();
        tour.order
            .iter()
            .filter_map(|&index| slots[index].take())
            .collect()
    }
}
