//! Cookie session state and form login
//!
//! Servers configured for forms authentication reject the API key alone and
//! expect a session cookie obtained by POSTing the credentials to `/login`.
//! The cookie jar lives on [`Session`], which every clone of a
//! [`StarrClient`] shares, whichever HTTP client carries the requests. The
//! jar is created on the first login attempt and kept for the life of the
//! client; cookies in it are only ever written by the transport layer from
//! `Set-Cookie` response headers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderValue, LOCATION, SET_COOKIE};
use reqwest::{Body, Method, Response, Url};
use tracing::{debug, info, warn};

use crate::client::StarrClient;
use crate::decode::{check_response, read_capped};
use crate::error::{Result, StarrError};

/// Path the login form is posted to, relative to the base URL.
pub const LOGIN_PATH: &str = "/login";

/// Marker the servers put in the redirect location after a rejected login.
const LOGIN_FAILED_MARKER: &str = "loginFailed";

#[derive(Debug, Default)]
pub struct Session {
    jar: OnceLock<Arc<Jar>>,
    logged_in: AtomicBool,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cookie jar, if a login has been attempted.
    #[must_use]
    pub fn jar(&self) -> Option<&Arc<Jar>> {
        self.jar.get()
    }

    fn jar_or_init(&self) -> &Arc<Jar> {
        self.jar.get_or_init(|| Arc::new(Jar::default()))
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::Acquire)
    }

    fn set_logged_in(&self, logged_in: bool) {
        self.logged_in.store(logged_in, Ordering::Release);
    }

    /// `Cookie` header value to send to `url`.
    #[must_use]
    pub fn cookie_header(&self, url: &Url) -> Option<HeaderValue> {
        self.jar()?.cookies(url)
    }

    /// Record the `Set-Cookie` headers of `response`. No-op without a jar.
    pub fn store_cookies(&self, response: &Response) {
        if let Some(jar) = self.jar() {
            let mut headers = response.headers().get_all(SET_COOKIE).iter();
            jar.set_cookies(&mut headers, response.url());
        }
    }

    #[must_use]
    pub fn has_cookies_for(&self, url: &Url) -> bool {
        self.cookie_header(url).is_some()
    }
}

impl StarrClient {
    /// Log in with the configured username and password.
    ///
    /// The form is posted through a client that never follows redirects, so
    /// the cookie set on the login redirect always reaches the session. The
    /// attempt succeeds when the login response itself sets a cookie, the
    /// jar then holds one for the base URL, and neither the `Location` header
    /// nor the response URL carries the failed-login marker. A cookie left
    /// over from an earlier login does not count. Safe to call repeatedly;
    /// each call re-validates the credentials.
    pub async fn login(&self) -> Result<()> {
        let session = self.session();
        session.jar_or_init();

        let username = self.username();
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", self.password())
            .finish();
        let login_url = format!("{}{LOGIN_PATH}", self.url());

        let response = match self.post_login_form(&login_url, form).await {
            Ok(response) => response,
            Err(err) => {
                session.set_logged_in(false);
                warn!(username, error = %err, "Login request failed");
                return Err(StarrError::auth(username, Some(err)));
            }
        };

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let sets_cookie = response.headers().contains_key(SET_COOKIE);
        let rejected = response.url().as_str().contains(LOGIN_FAILED_MARKER)
            || location
                .as_deref()
                .is_some_and(|l| l.contains(LOGIN_FAILED_MARKER));
        if let Err(err) = read_capped(response).await {
            debug!(username, error = %err, "Discarding unreadable login body");
        }

        let base = Url::parse(self.url()).map_err(|source| StarrError::InvalidUrl {
            url: self.url().to_string(),
            source,
        })?;

        if rejected || !sets_cookie || !session.has_cookies_for(&base) {
            session.set_logged_in(false);
            debug!(username, ?location, sets_cookie, "Login rejected by server");
            return Err(StarrError::auth(username, None));
        }

        session.set_logged_in(true);
        info!(username, url = %self.url(), "Logged in");
        Ok(())
    }

    /// POST the login form. 2xx and 3xx answers are returned for inspection,
    /// anything else is a status error.
    async fn post_login_form(&self, url: &str, form: String) -> Result<Response> {
        let client = self.login_client()?;
        let response = self
            .send(client, Method::POST, url, None, Some(Body::from(form)))
            .await?;
        if response.status().is_redirection() {
            return Ok(response);
        }
        check_response(&Method::POST, response).await
    }

    /// Whether the last login attempt succeeded.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.session().is_logged_in()
    }
}
