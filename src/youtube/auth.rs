//! OAuth2 token handling for the installed-app flow.
//!
//! The sweeper only talks to the standard token endpoint: it exchanges a
//! one-time authorization code, refreshes expired access tokens, and keeps the
//! result in a JSON token file compatible with Google's client libraries.

use std::{
    fmt, fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::AuthError;

pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";
const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const OOB_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";
/// Refresh this long before the recorded expiry.
const EXPIRY_SKEW_MS: i64 = 60_000;

#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn obtain_token(&self) -> Result<AccessToken, AuthError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let raw = fs::read_to_string(path).map_err(|source| AuthError::CredentialsRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, AuthError> {
        let invalid = |reason: String| AuthError::CredentialsInvalid {
            path: path.display().to_string(),
            reason,
        };
        let file: CredentialsFile =
            serde_json::from_str(raw).map_err(|err| invalid(err.to_string()))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| invalid("expected an \"installed\" or \"web\" client".to_string()))
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(OOB_REDIRECT)
    }

    pub fn authorization_url(&self) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &self.auth_uri,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri()),
                ("response_type", "code"),
                ("scope", YOUTUBE_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
    }
}

/// Token file contents. `expiry_date` is milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl StoredToken {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expiry_date
            .map(|expiry| expiry - EXPIRY_SKEW_MS <= now_ms)
            .unwrap_or(false)
    }

    fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            scope: response.scope,
            token_type: response.token_type,
            expiry_date: response
                .expires_in
                .map(|secs| Utc::now().timestamp_millis() + secs * 1_000),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
    token_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<StoredToken>, AuthError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|err| self.store_error(err.to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.store_error(err.to_string())),
        }
    }

    pub fn save(&self, token: &StoredToken) -> Result<(), AuthError> {
        let payload =
            serde_json::to_vec(token).map_err(|err| self.store_error(err.to_string()))?;
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .map_err(|err| self.store_error(err.to_string()))?;
        // `mode` only applies on creation; tighten files left by older runs.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(err) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
                tracing::warn!(
                    target: "auth",
                    path = %self.path.display(),
                    error = %err,
                    "unable to restrict token file permissions"
                );
            }
        }
        file.write_all(&payload)
            .and_then(|()| file.sync_all())
            .map_err(|err| self.store_error(err.to_string()))?;
        Ok(())
    }

    fn store_error(&self, reason: String) -> AuthError {
        AuthError::TokenStore {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

/// Uses the persisted token, refreshing it when it has expired.
pub struct CachedTokenAuth {
    http: Client,
    secrets: ClientSecrets,
    store: TokenStore,
    current: Mutex<Option<StoredToken>>,
}

impl CachedTokenAuth {
    pub fn new(http: Client, secrets: ClientSecrets, store: TokenStore) -> Self {
        Self {
            http,
            secrets,
            store,
            current: Mutex::new(None),
        }
    }

    pub fn secrets(&self) -> &ClientSecrets {
        &self.secrets
    }

    fn snapshot(&self) -> Result<Option<StoredToken>, AuthError> {
        if let Some(token) = self.current.lock().clone() {
            return Ok(Some(token));
        }
        let loaded = self.store.load()?;
        if loaded.is_some() {
            *self.current.lock() = loaded.clone();
        }
        Ok(loaded)
    }

    fn install(&self, token: StoredToken) -> Result<AccessToken, AuthError> {
        self.store.save(&token)?;
        let access = AccessToken(token.access_token.clone());
        *self.current.lock() = Some(token);
        Ok(access)
    }

    fn token_request(&self, params: &[(&str, &str)]) -> RequestBuilder {
        self.http.post(&self.secrets.token_uri).form(params)
    }

    fn refresh_params<'a>(&'a self, refresh_token: &'a str) -> [(&'a str, &'a str); 4] {
        [
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ]
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self.token_request(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn refresh(&self, token: StoredToken) -> Result<AccessToken, AuthError> {
        let refresh_token = token.refresh_token.ok_or_else(|| AuthError::NotRefreshable {
            path: self.store.path().display().to_string(),
        })?;
        tracing::info!(target: "auth", "access token expired; refreshing");
        let response = self
            .request_token(&self.refresh_params(&refresh_token))
            .await?;
        self.install(StoredToken::from_response(response, Some(refresh_token)))
    }

    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, AuthError> {
        let response = self
            .request_token(&[
                ("code", code),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("redirect_uri", self.secrets.redirect_uri()),
                ("grant_type", "authorization_code"),
            ])
            .await?;
        let access = self.install(StoredToken::from_response(response, None))?;
        tracing::info!(
            target: "auth",
            path = %self.store.path().display(),
            "token stored"
        );
        Ok(access)
    }
}

#[async_trait]
impl AuthProvider for CachedTokenAuth {
    async fn obtain_token(&self) -> Result<AccessToken, AuthError> {
        let token = self.snapshot()?.ok_or_else(|| AuthError::MissingToken {
            path: self.store.path().display().to_string(),
        })?;
        if token.is_expired(Utc::now().timestamp_millis()) {
            return self.refresh(token).await;
        }
        Ok(AccessToken(token.access_token))
    }
}

/// Falls back to the console authorization-code flow when no token is stored.
pub struct InteractiveAuth {
    inner: CachedTokenAuth,
}

impl InteractiveAuth {
    pub fn new(inner: CachedTokenAuth) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AuthProvider for InteractiveAuth {
    async fn obtain_token(&self) -> Result<AccessToken, AuthError> {
        match self.inner.obtain_token().await {
            Err(AuthError::MissingToken { .. }) => {
                let url = self
                    .inner
                    .secrets()
                    .authorization_url()
                    .map_err(|err| AuthError::Prompt(err.to_string()))?;
                let code = prompt_for_code(url).await?;
                self.inner.exchange_code(&code).await
            }
            other => other,
        }
    }
}

async fn prompt_for_code(url: Url) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "Authorize this app by visiting this URL: {url}")?;
        write!(out, "Enter the code from that page here: ")?;
        out.flush()?;

        let mut code = String::new();
        io::stdin().lock().read_line(&mut code)?;
        Ok::<_, io::Error>(code.trim().to_string())
    })
    .await
    .map_err(|err| AuthError::Prompt(err.to_string()))?
    .map_err(|err| AuthError::Prompt(err.to_string()))
    .and_then(|code| {
        if code.is_empty() {
            Err(AuthError::Prompt("empty authorization code".to_string()))
        } else {
            Ok(code)
        }
    })
}
