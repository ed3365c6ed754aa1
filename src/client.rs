use crate::auth::{AccessToken, Authenticator};
use crate::catalog::{CatalogService, PlaylistDetails, TrackPage, TrackRef};
use crate::config::Config;
use crate::models::{
    AddTracksRequest, ApiErrorResponse, AudioFeaturesResponse, CreatePlaylistRequest,
    CreatedPlaylist, Paging, PlaylistItem, PlaylistResponse, SnapshotResponse,
};
use crate::ordering::FeatureRecord;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::time::Duration;
use ureq::{Agent, AgentBuilder, Response};
use urlencoding::encode;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const MAX_RATE_LIMIT_RETRIES: u32 = 3;
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// Catalog URI for a track id
pub fn track_uri(id: &str) -> String {
    format!("spotify:track:{id}")
}

/// Seconds to wait after a 429, from the `Retry-After` header, capped at a minute
pub fn retry_after_secs(header: Option<&str>) -> u64 {
    let requested = header
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    if requested > MAX_RETRY_AFTER_SECS {
        warn!("Retry-After of {requested}s exceeds {MAX_RETRY_AFTER_SECS}s, waiting {MAX_RETRY_AFTER_SECS}s instead");
        return MAX_RETRY_AFTER_SECS;
    }
    requested
}

#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(u64),
    GiveUp,
}

/// Whether a failed call is retried; `attempt` counts retries already made
pub fn retry_decision(status: u16, attempt: u32, retry_after: Option<&str>) -> RetryDecision {
    if status == 429 && attempt < MAX_RATE_LIMIT_RETRIES {
        RetryDecision::RetryAfter(retry_after_secs(retry_after))
    } else {
        RetryDecision::GiveUp
    }
}

/// Refresh token to renew with, or `None` while the token is still usable
fn pending_refresh(token: &AccessToken, now: DateTime<Utc>) -> Result<Option<String>> {
    if !token.is_expiring(now) {
        return Ok(None);
    }
    token
        .refresh_token
        .clone()
        .map(Some)
        .ok_or_else(|| anyhow!("Access token expired and cannot be refreshed"))
}

/// Readable message for a failed API call, preferring the JSON error envelope
pub fn api_error_message(code: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => format!("HTTP {}: {}", parsed.error.status, parsed.error.message),
        Err(_) if body.trim().is_empty() => format!("HTTP {code}"),
        Err(_) => format!("HTTP {code}: {}", body.trim()),
    }
}

/// A Spotify Web API client authenticated with a user token
pub struct SpotifyClient {
    agent: Agent,
    api_base: String,
    auth: Authenticator,
    token: RefCell<AccessToken>,
}

impl SpotifyClient {
    /// Create a client, obtaining a user token before returning
    pub fn connect(config: Config) -> Result<Self> {
        let agent = AgentBuilder::new()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build();
        let api_base = config.api_base.clone();
        let auth = Authenticator::new(agent.clone(), config);
        let token = auth.obtain().context("Authentication failed")?;

        Ok(SpotifyClient {
            agent,
            api_base,
            auth,
            token: RefCell::new(token),
        })
    }

    /// Current bearer header, renewing the token first when it is about to expire
    fn bearer(&self) -> Result<String> {
        let refresh_token = {
            let token = self.token.borrow();
            match pending_refresh(&token, Utc::now())? {
                Some(refresh_token) => refresh_token,
                None => return Ok(token.bearer()),
            }
        };

        debug!("Access token about to expire, refreshing");
        let renewed = self.auth.refresh(&refresh_token)?;
        let bearer = renewed.bearer();
        *self.token.borrow_mut() = renewed;
        Ok(bearer)
    }

    /// Send a request, waiting out rate limits; non-2xx statuses become errors
    fn execute(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.api_base, path);
        let mut attempt = 0;

        loop {
            let mut request = self
                .agent
                .request(method, &url)
                .set("Authorization", &self.bearer()?);
            for (key, value) in query {
                request = request.query(key, value);
            }
            debug!("{method} {path}");

            let result = match &body {
                Some(json) => request.send_json(json),
                None => request.call(),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(ureq::Error::Status(code, response)) => {
                    let decision = retry_decision(code, attempt, response.header("Retry-After"));
                    match decision {
                        RetryDecision::RetryAfter(wait) => {
                            attempt += 1;
                            warn!(
                                "Rate limited on {path}, retrying in {wait}s (attempt {attempt}/{MAX_RATE_LIMIT_RETRIES})"
                            );
                            std::thread::sleep(Duration::from_secs(wait));
                        }
                        RetryDecision::GiveUp => {
                            let body = response.into_string().unwrap_or_default();
                            return Err(anyhow!(
                                "{method} {path} failed with {}",
                                api_error_message(code, &body)
                            ));
                        }
                    }
                }
                Err(e) => return Err(anyhow!("{method} {path} failed: {e}")),
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.execute("GET", path, query, None)?
            .into_json()
            .with_context(|| format!("Failed to parse response from {path}"))
    }

    fn post_json<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        self.execute("POST", path, &[], Some(body))?
            .into_json()
            .with_context(|| format!("Failed to parse response from {path}"))
    }
}

impl CatalogService for SpotifyClient {
    fn playlist_details(&self, playlist_id: &str) -> Result<PlaylistDetails> {
        let playlist: PlaylistResponse = self.get_json(
            &format!("/playlists/{}", encode(playlist_id)),
            &[("fields", "id,name,description,public,owner(id)".to_string())],
        )?;
        debug!("Fetched details of playlist {}", playlist.id);
        Ok(playlist.into())
    }

    fn playlist_tracks(&self, playlist_id: &str, offset: usize, limit: usize) -> Result<TrackPage> {
        let page: Paging<PlaylistItem> = self.get_json(
            &format!("/playlists/{}/tracks", encode(playlist_id)),
            &[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("fields", "items(is_local,track(id,name)),next,offset,total".to_string()),
            ],
        )?;
        debug!(
            "Track page at offset {:?} of {:?} total",
            page.offset, page.total
        );

        Ok(TrackPage {
            has_next: page.next.is_some(),
            tracks: page.items.into_iter().map(TrackRef::from).collect(),
        })
    }

    fn audio_features(&self, track_ids: &[String]) -> Result<Vec<Option<FeatureRecord>>> {
        let response: AudioFeaturesResponse =
            self.get_json("/audio-features", &[("ids", track_ids.join(","))])?;

        Ok(response
            .audio_features
            .into_iter()
            .map(|features| features.map(FeatureRecord::from))
            .collect())
    }

    fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: Option<bool>,
        description: Option<String>,
    ) -> Result<String> {
        let request = CreatePlaylistRequest {
            name,
            public,
            description: description.as_deref(),
        };
        let created: CreatedPlaylist = self.post_json(
            &format!("/users/{}/playlists", encode(user_id)),
            serde_json::to_value(&request)?,
        )?;
        debug!("Created playlist '{}' with id {}", created.name, created.id);
        Ok(created.id)
    }

    fn add_tracks(&self, playlist_id: &str, track_ids: &[String], position: usize) -> Result<()> {
        let request = AddTracksRequest {
            uris: track_ids.iter().map(|id| track_uri(id)).collect(),
            position,
        };
        let snapshot: SnapshotResponse = self.post_json(
            &format!("/playlists/{}/tracks", encode(playlist_id)),
            serde_json::to_value(&request)?,
        )?;
        debug!("Playlist {} now at snapshot {}", playlist_id, snapshot.snapshot_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_track_uri() {
        assert_eq!(track_uri("4uLU6hMCjMI75M1A2tKUQC"), "spotify:track:4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn test_retry_after_parsing() {
        assert_eq!(retry_after_secs(Some("7")), 7);
        assert_eq!(retry_after_secs(Some(" 2 ")), 2);
        assert_eq!(retry_after_secs(Some("soon")), DEFAULT_RETRY_AFTER_SECS);
        assert_eq!(retry_after_secs(None), DEFAULT_RETRY_AFTER_SECS);
    }

    #[test]
    fn test_retry_after_is_capped() {
        assert_eq!(retry_after_secs(Some("60")), 60);
        assert_eq!(retry_after_secs(Some("3600")), MAX_RETRY_AFTER_SECS);
    }

    #[test]
    fn test_rate_limit_retried_three_times_then_fails() {
        for attempt in 0..MAX_RATE_LIMIT_RETRIES {
            assert_eq!(
                retry_decision(429, attempt, Some("2")),
                RetryDecision::RetryAfter(2),
                "attempt {attempt}"
            );
        }
        // the fourth 429 is returned as an error
        assert_eq!(retry_decision(429, 3, Some("2")), RetryDecision::GiveUp);
        assert_eq!(retry_decision(429, 0, Some("86400")), RetryDecision::RetryAfter(60));
    }

    #[test]
    fn test_other_statuses_are_not_retried() {
        assert_eq!(retry_decision(500, 0, None), RetryDecision::GiveUp);
        assert_eq!(retry_decision(404, 0, Some("5")), RetryDecision::GiveUp);
        assert_eq!(retry_decision(401, 1, None), RetryDecision::GiveUp);
    }

    fn token_expiring_at(expires_at: DateTime<Utc>, refresh: Option<&str>) -> AccessToken {
        AccessToken {
            access_token: "access".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_at,
        }
    }

    #[test]
    fn test_token_renewed_only_near_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let fresh = token_expiring_at(now + chrono::Duration::minutes(10), Some("r"));
        assert_eq!(pending_refresh(&fresh, now).unwrap(), None);

        let expiring = token_expiring_at(now + chrono::Duration::seconds(20), Some("r"));
        assert_eq!(pending_refresh(&expiring, now).unwrap().as_deref(), Some("r"));

        let expired = token_expiring_at(now - chrono::Duration::minutes(1), None);
        assert!(pending_refresh(&expired, now).is_err());
    }

    fn client_with_token(token: AccessToken) -> SpotifyClient {
        let config = crate::config::from_lookup(|key| match key {
            "SPOTIFY_CLIENT_ID" => Some("id".to_string()),
            "SPOTIFY_CLIENT_SECRET" => Some("secret".to_string()),
            "SPOTIFY_REDIRECT_URI" => Some("http://127.0.0.1:8888/callback".to_string()),
            _ => None,
        })
        .unwrap();
        let agent = AgentBuilder::new().build();
        SpotifyClient {
            api_base: config.api_base.clone(),
            auth: Authenticator::new(agent.clone(), config),
            agent,
            token: RefCell::new(token),
        }
    }

    #[test]
    fn test_bearer_uses_valid_token() {
        let client = client_with_token(token_expiring_at(Utc::now() + chrono::Duration::hours(1), None));
        assert_eq!(client.bearer().unwrap(), "Bearer access");
    }

    #[test]
    fn test_expired_token_without_refresh_token_fails() {
        let client = client_with_token(token_expiring_at(Utc::now() - chrono::Duration::minutes(5), None));
        let err = client.bearer().unwrap_err();
        assert!(err.to_string().contains("cannot be refreshed"));
    }

    #[test]
    fn test_api_error_message_prefers_envelope() {
        let body = r#"{"error": {"status": 403, "message": "Insufficient client scope"}}"#;
        assert_eq!(api_error_message(403, body), "HTTP 403: Insufficient client scope");
        assert_eq!(api_error_message(502, "Bad gateway"), "HTTP 502: Bad gateway");
        assert_eq!(api_error_message(500, "  "), "HTTP 500");
    }
}
