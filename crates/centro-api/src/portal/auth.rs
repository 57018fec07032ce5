// Portal authentication
//
// Two-step form login: fetch the login page to scrape the anti-forgery
// token, then post the credentials. The portal answers a good login with
// a redirect and sets the session cookie in the client's jar.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use tracing::{debug, info};

use super::{LOGIN_CHECK, LOGIN_PAGE};
use crate::error::Error;
use crate::portal::client::PortalClient;

static CSRF_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="_csrf_token"\s+value="([^"]+)""#).expect("valid CSRF token pattern")
});

/// Pull the `_csrf_token` value out of the login page markup.
pub fn extract_csrf_token(html: &str) -> Option<&str> {
    CSRF_TOKEN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn is_login_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

impl PortalClient {
    /// Log in with the configured credentials.
    ///
    /// Fails with [`Error::Authentication`] if the login page carries no
    /// anti-forgery token, if `POST /login_check` does not redirect, or if
    /// it redirects straight back to the login page.
    pub async fn login(&self) -> Result<(), Error> {
        self.invalidate_session();

        let page_url = self.url(LOGIN_PAGE)?;
        debug!("fetching login page at {}", page_url);

        let html = self
            .http()
            .get(page_url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        let token = extract_csrf_token(&html).ok_or_else(|| Error::Authentication {
            message: "anti-forgery token not found on login page".into(),
        })?;

        let (email, password) = self.credentials();
        let form = [
            ("_csrf_token", token),
            ("_username", email),
            ("_password", password.expose_secret()),
        ];

        let check_url = self.url(LOGIN_CHECK)?;
        debug!("submitting credentials to {}", check_url);

        let resp = self
            .http()
            .post(check_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !is_login_redirect(status) {
            return Err(Error::Authentication {
                message: format!("login was not redirected (HTTP {status})"),
            });
        }

        let bounced = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|loc| loc.trim_end_matches('/').ends_with(LOGIN_PAGE));
        if bounced {
            return Err(Error::Authentication {
                message: "credentials rejected (redirected back to login)".into(),
            });
        }

        self.mark_logged_in();
        info!(install_id = self.install_id(), "logged in to portal");
        Ok(())
    }

    /// Log in unless a session is already established.
    ///
    /// Concurrent callers share one login attempt.
    pub async fn ensure_session(&self) -> Result<(), Error> {
        if self.is_logged_in() {
            return Ok(());
        }

        let _guard = self.login_lock().lock().await;
        if self.is_logged_in() {
            return Ok(());
        }
        self.login().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_token_in_login_form() {
        let html = r#"<form><input type="hidden" name="_csrf_token"
            value="abc123-XYZ"><input name="_username"></form>"#;
        assert_eq!(extract_csrf_token(html), Some("abc123-XYZ"));
    }

    #[test]
    fn missing_token_yields_none() {
        assert_eq!(extract_csrf_token("<html><body>maintenance</body></html>"), None);
        assert_eq!(extract_csrf_token(r#"name="_csrf_token" value="""#), None);
    }

    #[test]
    fn only_redirects_count_as_login() {
        assert!(is_login_redirect(StatusCode::FOUND));
        assert!(is_login_redirect(StatusCode::SEE_OTHER));
        assert!(!is_login_redirect(StatusCode::OK));
        assert!(!is_login_redirect(StatusCode::NOT_MODIFIED));
    }
}
