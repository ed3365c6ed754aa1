use anyhow::{Result, anyhow};
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_BASE: &str = "https://accounts.spotify.com";
pub const DEFAULT_TOKEN_CACHE: &str = ".spotify_token_cache";

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: Option<String>,
    pub token_cache: PathBuf,
    pub api_base: String,
    pub auth_base: String,
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from any variable source; `SPOTIPY_*` names are accepted as fallbacks
pub fn from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| {
        lookup(&format!("SPOTIFY_{name}"))
            .or_else(|| lookup(&format!("SPOTIPY_{name}")))
            .filter(|value| !value.trim().is_empty())
    };
    let require = |name: &str| {
        get(name).ok_or_else(|| anyhow!("Missing required environment variable SPOTIFY_{name}"))
    };

    Ok(Config {
        client_id: require("CLIENT_ID")?,
        client_secret: require("CLIENT_SECRET")?,
        redirect_uri: require("REDIRECT_URI")?,
        refresh_token: get("REFRESH_TOKEN"),
        token_cache: get("TOKEN_CACHE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_CACHE)),
        api_base: get("API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        auth_base: get("AUTH_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_AUTH_BASE.to_string()),
    })
}
