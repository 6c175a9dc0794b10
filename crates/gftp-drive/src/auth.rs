//! OAuth2 installed-app authorization for Google Drive
//!
//! Implements the Authorization Code flow with PKCE against Google's OAuth
//! endpoints:
//! - [`ClientSecret`] - Parses the client secret JSON downloaded from the
//!   Google Cloud console (`installed` or `web` section)
//! - [`TokenFileStorage`] - Token cache file, mode 0600 on Unix
//! - [`OAuthFlow`] - Authorization URL, code exchange and refresh
//! - [`LocalCallbackServer`] - Loopback listener receiving the redirect
//! - [`DriveCredentialProvider`] - [`ICredentialProvider`] tying it together

use std::convert::Infallible;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use gftp_core::config::AuthConfig;
use gftp_core::ports::{Credential, ICredentialProvider};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse,
    TokenUrl,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Google authorization endpoint
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// A credential is renewed when it expires within this many seconds
const EXPIRY_SKEW_SECS: i64 = 60;

/// Assumed lifetime when the token response has no `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Errors raised while obtaining a credential
#[derive(Debug, Error)]
pub enum AuthError {
    /// The client secret file does not exist
    #[error("Client secret file not found: {}", path.display())]
    MissingClientSecret {
        /// Expected location
        path: PathBuf,
    },

    /// The client secret file could not be read or parsed
    #[error("Invalid client secret file {}: {message}", path.display())]
    InvalidClientSecret {
        /// File location
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// The token cache could not be read or written
    #[error("Token cache error on {}: {source}", path.display())]
    TokenCache {
        /// File location
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The browser, callback, code exchange or refresh failed
    #[error("Authorization failed: {0}")]
    Flow(String),
}

// ============================================================================
// ClientSecret
// ============================================================================

/// OAuth client registration, as downloaded from the Google Cloud console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecretEntry>,
    web: Option<ClientSecretEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretEntry {
    client_id: String,
    client_secret: Option<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl ClientSecret {
    /// Parses the console JSON; `installed` takes precedence over `web`
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretFile =
            serde_json::from_str(json).context("Client secret is not valid JSON")?;
        let Some(entry) = file.installed.or(file.web) else {
            bail!("expected an \"installed\" or \"web\" section");
        };
        if entry.client_id.trim().is_empty() {
            bail!("client_id is empty");
        }

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret.filter(|s| !s.is_empty()),
            auth_uri: entry
                .auth_uri
                .unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: entry
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }

    /// Reads and parses the client secret file
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(AuthError::MissingClientSecret {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => {
                return Err(AuthError::InvalidClientSecret {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        Self::from_json(&content).map_err(|e| AuthError::InvalidClientSecret {
            path: path.to_path_buf(),
            message: format!("{e:#}"),
        })
    }
}

// ============================================================================
// TokenFileStorage
// ============================================================================

/// JSON token cache on disk
///
/// Written after every successful authorization or refresh. Readable by the
/// owner only on Unix.
#[derive(Debug, Clone)]
pub struct TokenFileStorage {
    path: PathBuf,
}

impl TokenFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cache_error(&self, source: io::Error) -> AuthError {
        AuthError::TokenCache {
            path: self.path.clone(),
            source,
        }
    }

    /// Loads the cached credential
    ///
    /// A missing file is `Ok(None)`. A file that no longer parses is also
    /// treated as absent so that the user is asked to authorize again.
    pub fn load(&self) -> Result<Option<Credential>, AuthError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.cache_error(e)),
        };

        match serde_json::from_str::<Credential>(&content) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable token cache");
                Ok(None)
            }
        }
    }

    /// Writes the credential, creating parent directories as needed
    pub fn store(&self, credential: &Credential) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.cache_error(e))?;
        }

        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| self.cache_error(io::Error::other(e)))?;
        write_private(&self.path, json.as_bytes()).map_err(|e| self.cache_error(e))?;

        debug!(path = %self.path.display(), "Stored credential");
        Ok(())
    }

    /// Deletes the cache file
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn clear(&self) -> Result<bool, AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Removed token cache");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.cache_error(e)),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    std::fs::write(path, contents)
}

// ============================================================================
// OAuthFlow
// ============================================================================

type GoogleClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Authorization Code + PKCE flow using the `oauth2` crate
pub struct OAuthFlow {
    client: GoogleClient,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

impl OAuthFlow {
    /// Creates a flow for the given client registration
    pub fn new(secret: &ClientSecret, scopes: &[String]) -> Result<Self> {
        let mut client = BasicClient::new(ClientId::new(secret.client_id.clone()))
            .set_auth_uri(AuthUrl::new(secret.auth_uri.clone()).context("Invalid authorization URL")?)
            .set_token_uri(TokenUrl::new(secret.token_uri.clone()).context("Invalid token URL")?);
        if let Some(client_secret) = &secret.client_secret {
            client = client.set_client_secret(oauth2::ClientSecret::new(client_secret.clone()));
        }

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build OAuth HTTP client")?;

        Ok(Self {
            client,
            scopes: scopes.to_vec(),
            http_client,
        })
    }

    /// Sets the redirect URI the authorization server sends the browser to
    pub fn with_redirect_uri(mut self, uri: &str) -> Result<Self> {
        self.client = self
            .client
            .set_redirect_uri(RedirectUrl::new(uri.to_string()).context("Invalid redirect URI")?);
        Ok(self)
    }

    /// Generates an authorization URL with a PKCE challenge
    ///
    /// # Returns
    /// A tuple of `(authorization_url, csrf_token, pkce_verifier)`.
    /// The `pkce_verifier` must be kept until the code exchange step.
    pub fn generate_auth_url(&self) -> (String, CsrfToken, PkceCodeVerifier) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self.client.authorize_url(CsrfToken::new_random);
        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        // Ask for a refresh token every time, not only on first consent
        let (auth_url, csrf_token) = auth_request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        debug!("Generated authorization URL");
        (auth_url.to_string(), csrf_token, pkce_verifier)
    }

    /// Exchanges an authorization code for a credential
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
    ) -> Result<Credential> {
        info!("Exchanging authorization code for tokens");

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http_client)
            .await
            .context("Failed to exchange authorization code")?;

        Ok(Credential {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().to_string()),
            expires_at: expiry_from(token_result.expires_in()),
        })
    }

    /// Obtains a new access token from a refresh token
    ///
    /// Google usually omits the refresh token in the response; the one that
    /// was used is kept in that case.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        info!("Refreshing access token");

        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await
            .context("Failed to refresh token")?;

        Ok(Credential {
            access_token: token_result.access_token().secret().to_string(),
            refresh_token: token_result
                .refresh_token()
                .map(|t| t.secret().to_string())
                .or_else(|| Some(refresh_token.to_string())),
            expires_at: expiry_from(token_result.expires_in()),
        })
    }
}

fn expiry_from(expires_in: Option<std::time::Duration>) -> chrono::DateTime<Utc> {
    let secs = expires_in
        .map(|d| d.as_secs() as i64)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Utc::now() + Duration::seconds(secs)
}

// ============================================================================
// LocalCallbackServer
// ============================================================================

/// Loopback HTTP listener for the OAuth redirect
///
/// Binds `127.0.0.1` on the configured port (`0` picks a free one) before
/// the authorization URL is built, so the redirect URI carries the real port.
pub struct LocalCallbackServer {
    listener: tokio::net::TcpListener,
}

/// Parameters extracted from the OAuth2 callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// The authorization code
    pub code: String,
    /// The CSRF state parameter
    pub state: String,
}

impl LocalCallbackServer {
    /// Binds the listener
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("Failed to bind callback server to 127.0.0.1:{port}"))?;
        Ok(Self { listener })
    }

    /// Redirect URI pointing at this listener
    pub fn redirect_uri(&self) -> Result<String> {
        let addr = self
            .listener
            .local_addr()
            .context("Failed to read callback server address")?;
        Ok(format!("http://127.0.0.1:{}/", addr.port()))
    }

    /// Serves requests until the redirect arrives
    ///
    /// Requests without `code` or `error` (a browser's favicon request, for
    /// instance) get a 404 and are otherwise ignored.
    pub async fn wait_for_callback(self) -> Result<CallbackParams> {
        use hyper::server::conn::http1;
        use hyper::service::service_fn;
        use hyper::{Request, StatusCode};
        use hyper_util::rt::TokioIo;
        use tokio::sync::mpsc;

        info!(uri = %self.redirect_uri()?, "Waiting for OAuth callback");

        let (tx, mut rx) = mpsc::unbounded_channel::<std::result::Result<CallbackParams, String>>();

        loop {
            tokio::select! {
                outcome = rx.recv() => {
                    return match outcome {
                        Some(Ok(params)) => {
                            info!("Received OAuth callback with authorization code");
                            Ok(params)
                        }
                        Some(Err(message)) => Err(AuthError::Flow(message).into()),
                        None => bail!("Callback channel closed without receiving parameters"),
                    };
                }
                accepted = self.listener.accept() => {
                    let (stream, _addr) =
                        accepted.context("Failed to accept connection on callback server")?;
                    let io = TokioIo::new(stream);
                    let tx = tx.clone();

                    let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let tx = tx.clone();
                        async move {
                            let uri = req.uri().to_string();
                            debug!(uri = %uri, "Callback server received request");

                            let response = match parse_callback_params(&uri) {
                                Some(Ok(params)) => {
                                    let _ = tx.send(Ok(params));
                                    html_response(StatusCode::OK, success_html())
                                }
                                Some(Err(message)) => {
                                    let page = error_html(&message);
                                    let _ = tx.send(Err(message));
                                    html_response(StatusCode::BAD_REQUEST, page)
                                }
                                None => html_response(StatusCode::NOT_FOUND, String::new()),
                            };
                            Ok::<_, Infallible>(response)
                        }
                    });

                    tokio::spawn(async move {
                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            warn!("Callback server connection error: {}", e);
                        }
                    });
                }
            }
        }
    }
}

fn html_response(status: hyper::StatusCode, html: String) -> hyper::Response<Full<Bytes>> {
    let mut response = hyper::Response::new(Full::new(Bytes::from(html)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

/// Parses the redirect request target
///
/// Returns `None` for requests that are not the redirect, `Some(Err)` when
/// the authorization server reported an error, `Some(Ok)` with the code.
fn parse_callback_params(uri: &str) -> Option<std::result::Result<CallbackParams, String>> {
    let url = url::Url::parse(&format!("http://127.0.0.1{uri}")).ok()?;
    let mut code = None;
    let mut state = None;
    let mut error = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => error = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(format!("authorization server returned '{error}'")));
    }
    let code = code?;
    Some(Ok(CallbackParams {
        code,
        state: state.unwrap_or_default(),
    }))
}

/// Returns the HTML for a successful authorization page
fn success_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>gftp - Authorization Successful</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authorization Successful</h1>
    <p>gftp can now access your Google Drive.</p>
    <p>You can close this window and return to the terminal.</p>
</body>
</html>"#
        .to_string()
}

/// Returns the HTML for an authorization error page
fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>gftp - Authorization Error</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Authorization Error</h1>
    <p>{}</p>
    <p>Please close this window and try again.</p>
</body>
</html>"#,
        escape_html(message)
    )
}

/// Escapes text for inclusion in an HTML page
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// DriveCredentialProvider
// ============================================================================

/// Credential provider backed by the token cache and the interactive flow
///
/// 1. Use the cached credential if it does not expire within a minute.
/// 2. Otherwise refresh it if it carries a refresh token.
/// 3. Otherwise, or if the refresh fails, run the interactive flow.
///
/// Every newly obtained credential is written back to the cache.
pub struct DriveCredentialProvider {
    client_secret_file: PathBuf,
    scopes: Vec<String>,
    callback_port: u16,
    tokens: TokenFileStorage,
}

impl DriveCredentialProvider {
    /// Creates a provider from the `auth` configuration section
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client_secret_file: config.client_secret_path(),
            scopes: config.scopes.clone(),
            callback_port: config.callback_port,
            tokens: TokenFileStorage::new(config.token_path()),
        }
    }

    /// The token cache in use
    pub fn token_storage(&self) -> &TokenFileStorage {
        &self.tokens
    }

    /// Returns the cached credential without renewing it
    pub fn cached(&self) -> Result<Option<Credential>, AuthError> {
        self.tokens.load()
    }

    /// Runs the interactive flow regardless of the cache and stores the result
    pub async fn login(&self) -> Result<Credential, AuthError> {
        let credential = self.authorize_interactively().await.map_err(into_auth_error)?;
        self.tokens.store(&credential)?;
        Ok(credential)
    }

    /// Forgets the cached credential
    ///
    /// Returns `false` if no credential was cached.
    pub fn logout(&self) -> Result<bool, AuthError> {
        self.tokens.clear()
    }

    fn flow(&self) -> Result<OAuthFlow> {
        let secret = ClientSecret::load(&self.client_secret_file)?;
        OAuthFlow::new(&secret, &self.scopes)
    }

    async fn authorize_interactively(&self) -> Result<Credential> {
        info!("Starting OAuth2 PKCE authorization flow");

        let server = LocalCallbackServer::bind(self.callback_port).await?;
        let flow = self.flow()?.with_redirect_uri(&server.redirect_uri()?)?;
        let (auth_url, csrf_token, pkce_verifier) = flow.generate_auth_url();

        if let Err(e) = webbrowser::open(&auth_url) {
            warn!(error = %e, "Could not open a browser");
        }
        // Always shown so a remote or headless session can still complete
        warn!("Open this URL to authorize gftp: {auth_url}");

        let callback = server.wait_for_callback().await?;
        if callback.state != *csrf_token.secret() {
            return Err(AuthError::Flow("state parameter mismatch in callback".into()).into());
        }

        let credential = flow.exchange_code(callback.code, pkce_verifier).await?;
        info!("Authorization completed");
        Ok(credential)
    }

    async fn obtain(&self) -> Result<Credential> {
        if let Some(cached) = self.tokens.load()? {
            if !cached.expires_within(Duration::seconds(EXPIRY_SKEW_SECS)) {
                debug!("Using cached credential");
                return Ok(cached);
            }

            if let Some(refresh_token) = cached.refresh_token.as_deref().filter(|_| cached.can_refresh()) {
                match self.flow()?.refresh(refresh_token).await {
                    Ok(credential) => {
                        self.tokens.store(&credential)?;
                        return Ok(credential);
                    }
                    Err(e) => {
                        warn!(error = %format!("{e:#}"), "Refresh failed, authorizing again");
                    }
                }
            }
        }

        let credential = self.authorize_interactively().await?;
        self.tokens.store(&credential)?;
        Ok(credential)
    }
}

fn into_auth_error(err: anyhow::Error) -> AuthError {
    match err.downcast::<AuthError>() {
        Ok(auth) => auth,
        Err(other) => AuthError::Flow(format!("{other:#}")),
    }
}

#[async_trait]
impl ICredentialProvider for DriveCredentialProvider {
    async fn valid_credential(&self) -> Result<Credential> {
        self.obtain()
            .await
            .map_err(|e| anyhow::Error::from(into_auth_error(e)))
    }
}
