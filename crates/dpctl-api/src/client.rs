// CyberController HTTP client
//
// Wraps `reqwest::Client` with session login, cookie-based auth, and
// one transparent re-login on 403 (the controller expires sessions
// aggressively under concurrent operator logins). Verb helpers return
// the raw status + body; interpreting per-table response semantics is
// the caller's job.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::paths;
use crate::transport::TransportConfig;

/// Connection settings for a [`CcClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller address (`host` or `host:port`, no scheme).
    pub controller: String,
    pub username: String,
    pub password: SecretString,
    pub transport: TransportConfig,
}

/// One HTTP exchange with the controller, undecoded.
///
/// The configuration API mixes JSON bodies with occasional plain-text
/// responses, so decoding is deferred: [`json()`](Self::json) fails with
/// [`Error::InvalidResponse`] instead of panicking on a non-JSON body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, Error> {
        serde_json::from_str(&self.body).map_err(|e| Error::InvalidResponse {
            message: e.to_string(),
            body: self.body.clone(),
        })
    }
}

/// Authenticated session against one CyberController.
///
/// Created via [`connect()`](Self::connect), which logs in and stores the
/// session cookie in the underlying client's jar. All request paths are
/// absolute (`/mgmt/...`); see [`crate::paths`] for the builders.
#[derive(Debug)]
pub struct CcClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
}

impl CcClient {
    /// Connect and authenticate.
    pub async fn connect(config: ClientConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("https://{}", config.controller))?;
        Self::connect_url(base_url, config.username, config.password, &config.transport).await
    }

    /// Connect to an explicit base URL and authenticate.
    pub async fn connect_url(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let client = Self::with_client(http, base_url, username, password);
        client.login().await?;
        Ok(client)
    }

    /// Create a client from a pre-built `reqwest::Client` without logging in.
    ///
    /// The stored credentials are still used for 403-triggered re-login.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username,
            password,
        }
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// POST the login endpoint and verify the `{"status": "ok"}` body.
    async fn login(&self) -> Result<(), Error> {
        let url = self.url(paths::LOGIN_PATH)?;
        let body = json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        });

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login rejected with HTTP {status}: {text}"),
            });
        }

        let decoded: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| Error::InvalidResponse {
                message: format!("login response: {e}"),
                body: text.clone(),
            })?;

        if decoded.get("status").and_then(|s| s.as_str()) == Some("ok") {
            debug!(controller = %self.base_url, user = %self.username, "logged in");
            Ok(())
        } else {
            Err(Error::Authentication {
                message: format!("login failed: {decoded}"),
            })
        }
    }

    // ── Verb helpers ─────────────────────────────────────────────────

    /// GET a resource.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, Error> {
        self.request(reqwest::Method::GET, path, None).await
    }

    /// POST a resource, with an optional JSON body.
    pub async fn post(
        &self,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, Error> {
        self.request(reqwest::Method::POST, path, body).await
    }

    /// PUT a resource with a JSON body.
    pub async fn put(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ApiResponse, Error> {
        self.request(reqwest::Method::PUT, path, Some(body)).await
    }

    /// DELETE a resource, with an optional JSON body.
    pub async fn delete(
        &self,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, Error> {
        self.request(reqwest::Method::DELETE, path, body).await
    }

    /// Send one request, re-authenticating once on 403.
    ///
    /// Non-2xx statuses are NOT errors at this layer -- callers decide
    /// which codes are acceptable per verb.
    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, Error> {
        let first = self.send_once(method.clone(), path, body).await?;
        if first.status != 403 {
            return Ok(first);
        }

        warn!(%method, path, "403 from controller -- re-authenticating");
        self.login().await.map_err(|_| Error::SessionExpired)?;
        self.send_once(method, path, body).await
    }

    async fn send_once(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, Error> {
        let url = self.url(path)?;
        debug!(%method, %url, "request");

        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(Error::Transport)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(Error::Transport)?;
        Ok(ApiResponse { status, body })
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Convenience wrappers ─────────────────────────────────────────

    /// Acquire the configuration lock for a device.
    pub async fn lock_device(&self, device: &str) -> Result<serde_json::Value, Error> {
        self.lock_request(device, true).await
    }

    /// Release the configuration lock for a device.
    pub async fn unlock_device(&self, device: &str) -> Result<serde_json::Value, Error> {
        self.lock_request(device, false).await
    }

    async fn lock_request(&self, device: &str, lock: bool) -> Result<serde_json::Value, Error> {
        let resp = self.post(&paths::device_lock_path(device, lock), None).await?;
        if !resp.is_success() {
            return Err(Error::Rejected {
                status: resp.status,
                body: resp.body,
            });
        }
        resp.json()
    }
}
