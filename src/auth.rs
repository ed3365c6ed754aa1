use crate::config::Config;
use crate::models::TokenResponse;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use ureq::Agent;
use url::Url;
use urlencoding::encode;

/// Permissions needed to read the source playlist and write the copy
pub const SCOPES: &[&str] = &[
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-private",
    "playlist-modify-public",
];

/// Refresh this long before the catalog would reject the token
const EXPIRY_MARGIN_SECS: i64 = 30;

/// A bearer token together with what is needed to renew it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a token from a grant response; a refresh grant may omit the refresh token
    pub fn from_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: now + Duration::seconds(response.expires_in),
        }
    }

    pub fn is_expiring(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// JSON file holding the last token so later runs skip the browser step
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached token; a missing or unreadable cache is treated as empty
    pub fn load(&self) -> Option<AccessToken> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Ignoring unreadable token cache {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Write the token; on Unix the file is readable by the owner only
    pub fn save(&self, token: &AccessToken) -> Result<()> {
        let content = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write token cache {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| {
                    format!("Failed to restrict token cache {}", self.path.display())
                })?;
        }
        Ok(())
    }
}

/// Random value echoed back by the authorization redirect
pub fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// URL the user opens to grant access
pub fn authorize_url(config: &Config, state: &str) -> String {
    format!(
        "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
        config.auth_base,
        encode(&config.client_id),
        encode(&config.redirect_uri),
        encode(&SCOPES.join(" ")),
        encode(state)
    )
}

/// Pull the authorization code out of the URL the browser was redirected to
pub fn parse_redirect(redirected: &str, expected_state: &str) -> Result<String> {
    let url = Url::parse(redirected)
        .with_context(|| format!("'{redirected}' is not a valid redirect URL"))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Err(anyhow!("Authorization was refused: {value}")),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(anyhow!("Authorization state mismatch, please retry"));
    }
    code.ok_or_else(|| anyhow!("Redirect URL does not contain an authorization code"))
}

/// Obtains and renews access tokens through the accounts service
pub struct Authenticator {
    agent: Agent,
    config: Config,
    cache: TokenCache,
}

impl Authenticator {
    pub fn new(agent: Agent, config: Config) -> Self {
        let cache = TokenCache::new(config.token_cache.clone());
        Self {
            agent,
            config,
            cache,
        }
    }

    /// Get a usable token: configured refresh token, then the cache, then the browser
    pub fn obtain(&self) -> Result<AccessToken> {
        if let Some(refresh_token) = &self.config.refresh_token {
            info!("Authenticating with configured refresh token");
            return self.refresh(refresh_token);
        }

        if let Some(cached) = self.cache.load() {
            if !cached.is_expiring(Utc::now()) {
                debug!("Using cached access token");
                return Ok(cached);
            }
            if let Some(refresh_token) = &cached.refresh_token {
                match self.refresh(refresh_token) {
                    Ok(token) => return Ok(token),
                    Err(e) => warn!("Cached refresh token rejected: {e}"),
                }
            }
        }

        self.authorize_interactively()
    }

    /// Exchange a refresh token for a fresh access token
    pub fn refresh(&self, refresh_token: &str) -> Result<AccessToken> {
        let response = self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])?;
        let token = AccessToken::from_response(response, Some(refresh_token.to_string()), Utc::now());
        self.store(&token);
        Ok(token)
    }

    fn authorize_interactively(&self) -> Result<AccessToken> {
        let state = random_state();
        println!("Open this URL in a browser and approve access:\n");
        println!("  {}\n", authorize_url(&self.config, &state));
        print!("Paste the URL you were redirected to: ");
        std::io::stdout().flush()?;

        let mut redirected = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut redirected)
            .context("Failed to read redirect URL")?;
        let code = parse_redirect(redirected.trim(), &state)?;

        let response = self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])?;
        let token = AccessToken::from_response(response, None, Utc::now());
        self.store(&token);
        Ok(token)
    }

    fn request_token(&self, grant: &[(&str, &str)]) -> Result<TokenResponse> {
        let mut form = grant.to_vec();
        form.push(("client_id", self.config.client_id.as_str()));
        form.push(("client_secret", self.config.client_secret.as_str()));

        let url = format!("{}/api/token", self.config.auth_base);
        debug!("Requesting token ({})", grant[0].1);
        let response = self.agent.post(&url).send_form(&form).map_err(|e| match e {
            ureq::Error::Status(code, response) => anyhow!(
                "Token request failed with HTTP {}: {}",
                code,
                response.into_string().unwrap_or_default()
            ),
            other => anyhow!("Token request failed: {}", other),
        })?;

        response
            .into_json::<TokenResponse>()
            .context("Failed to parse token response")
    }

    fn store(&self, token: &AccessToken) {
        match self.cache.save(token) {
            Ok(()) => debug!("Cached token in {}", self.cache.path().display()),
            Err(e) => warn!("{e:#}"),
        }
    }
}
