// Portal HTTP client
//
// Wraps `reqwest::Client` with portal URL construction, the session flag
// and error classification. Login, control and status live in sibling
// modules as inherent methods.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::Mutex;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// HTTP client for the Centrometal web portal.
///
/// Owns the session exclusively: credentials, the cookie jar inside the
/// `reqwest::Client`, and a logged-in flag. Any failed call clears the flag
/// so the next call logs in again.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
    install_id: String,
    email: String,
    password: SecretString,
    timeout: Duration,
    logged_in: AtomicBool,
    login_lock: Mutex<()>,
}

impl PortalClient {
    /// Create a portal client from a `TransportConfig`.
    ///
    /// A cookie jar is added if the config has none; the session cookie
    /// set by `POST /login_check` is what authenticates later calls.
    pub fn new(
        base_url: Url,
        install_id: String,
        email: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        let mut client = Self::with_client(http, base_url, install_id, email, password);
        client.timeout = config.timeout;
        Ok(client)
    }

    /// Create a portal client around a pre-built `reqwest::Client`.
    ///
    /// The client should keep cookies and must not follow redirects.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        install_id: String,
        email: String,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            install_id,
            email,
            password,
            timeout: crate::transport::DEFAULT_TIMEOUT,
            logged_in: AtomicBool::new(false),
            login_lock: Mutex::new(()),
        }
    }

    /// Installation the client sends commands to.
    pub fn install_id(&self) -> &str {
        &self.install_id
    }

    /// Whether a session is currently believed valid.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::Acquire)
    }

    /// Forget the session. The next authenticated call logs in again.
    pub fn close(&self) {
        self.invalidate_session();
        tracing::debug!("portal session closed");
    }

    // ── Session flag ─────────────────────────────────────────────────

    pub(crate) fn mark_logged_in(&self) {
        self.logged_in.store(true, Ordering::Release);
    }

    pub(crate) fn invalidate_session(&self) {
        self.logged_in.store(false, Ordering::Release);
    }

    pub(crate) fn login_lock(&self) -> &Mutex<()> {
        &self.login_lock
    }

    pub(crate) fn credentials(&self) -> (&str, &SecretString) {
        (&self.email, &self.password)
    }

    // ── Transport helpers ────────────────────────────────────────────

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolve an absolute portal path against the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    /// Classify a reqwest failure, surfacing timeouts with their bound.
    pub(crate) fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}
