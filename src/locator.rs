use anyhow::{Context, Result, anyhow};
use url::Url;

const SHARE_HOST: &str = "open.spotify.com";

/// Extract a playlist id from a share URL, a `spotify:playlist:` URI or a bare id
pub fn parse_playlist_locator(locator: &str) -> Result<String> {
    let locator = locator.trim();

    let id = if let Some(rest) = locator.strip_prefix("spotify:") {
        // spotify:playlist:<id> or the older spotify:user:<user>:playlist:<id>
        let parts: Vec<&str> = rest.split(':').collect();
        match parts.as_slice() {
            ["playlist", id] | ["user", _, "playlist", id] => id.to_string(),
            _ => return Err(anyhow!("'{locator}' is not a playlist URI")),
        }
    } else if locator.contains("://") {
        playlist_id_from_url(locator)?
    } else if locator.starts_with(SHARE_HOST) {
        playlist_id_from_url(&format!("https://{locator}"))?
    } else {
        locator.to_string()
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(anyhow!("'{id}' is not a valid playlist id"));
    }
    Ok(id)
}

/// The segment after `playlist` in a share link, which may carry a locale prefix
fn playlist_id_from_url(link: &str) -> Result<String> {
    let url = Url::parse(link).with_context(|| format!("'{link}' is not a valid URL"))?;
    if url.host_str() != Some(SHARE_HOST) {
        return Err(anyhow!("'{link}' is not a {SHARE_HOST} link"));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    segments
        .iter()
        .position(|segment| *segment == "playlist")
        .and_then(|i| segments.get(i + 1))
        .map(|id| id.to_string())
        .ok_or_else(|| anyhow!("'{link}' is not a playlist URL"))
}
