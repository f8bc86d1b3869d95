//! *arr HTTP Client
//!
//! [`StarrClient`] is the connection profile every endpoint call goes
//! through: base URL, credentials, timeout and the HTTP client used to reach
//! the server. It builds the request, attaches authentication, executes it
//! and maps failures into [`StarrError`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, USER_AGENT};
use reqwest::{Body, Client, Method, Request, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::{Session, LOGIN_PATH};
use crate::decode::{check_response, decode_into};
use crate::error::{Result, StarrError};
use crate::path::api_url;
use crate::query::QueryParams;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CLIENT_USER_AGENT: &str = concat!("starr-client/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const APPLICATION_JSON: &str = "application/json";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Build the HTTP client used when the caller does not inject one.
///
/// Redirects are not followed, so login redirects and the cookies set on
/// them reach the session. A zero `timeout` leaves requests without an
/// overall deadline.
pub fn default_http_client(timeout: Duration, verify_ssl: bool) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(CLIENT_USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .danger_accept_invalid_certs(!verify_ssl);
    if !timeout.is_zero() {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| StarrError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Serialize `value` as a JSON request body.
pub fn json_body<T: Serialize + ?Sized>(value: &T) -> Result<Body> {
    Ok(Body::from(serde_json::to_vec(value)?))
}

/// Connection profile for one *arr server.
///
/// Cheap to clone; clones share the HTTP client and the login session.
#[derive(Clone)]
pub struct StarrClient {
    url: String,
    api_key: String,
    http_user: String,
    http_pass: String,
    username: String,
    password: String,
    timeout: Duration,
    client: Option<Client>,
    /// Never follows redirects; the same client as `client` unless one was injected.
    login_client: Option<Client>,
    session: Arc<Session>,
}

impl fmt::Debug for StarrClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StarrClient")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("http_user", &self.http_user)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .field("has_client", &self.client.is_some())
            .field("logged_in", &self.session.is_logged_in())
            .finish_non_exhaustive()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

impl StarrClient {
    /// Create a client authenticating with an API key, using a default HTTP
    /// client with certificate verification enabled.
    pub fn new(api_key: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::builder(url).api_key(api_key).timeout(timeout).build()
    }

    pub fn builder(url: impl Into<String>) -> StarrClientBuilder {
        StarrClientBuilder::new(url)
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Full URL for a path under the API prefix.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        api_url(&self.url, path)
    }

    fn http_auth(&self) -> Option<(&str, &str)> {
        if self.http_user.is_empty() || self.http_pass.is_empty() {
            None
        } else {
            Some((&self.http_user, &self.http_pass))
        }
    }

    /// Headers for a request to `url`, following the per-request policy:
    /// form content type and no `Accept` for the login POST, JSON otherwise,
    /// plus user agent, API key and any session cookies.
    fn build_headers(&self, method: &Method, url: &Url, has_body: bool) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let login_post = *method == Method::POST && url.path().ends_with(LOGIN_PATH);

        if has_body {
            let content_type = if login_post { FORM_URLENCODED } else { APPLICATION_JSON };
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        if !login_post {
            headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        }
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        if !self.api_key.is_empty() {
            let mut value = HeaderValue::from_str(&self.api_key)?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        if let Some(cookie) = self.session.cookie_header(url) {
            headers.insert(COOKIE, cookie);
        }

        Ok(headers)
    }

    /// Build the outbound request for an absolute URL.
    pub fn build_request(
        &self,
        method: Method,
        url: &str,
        params: Option<&QueryParams>,
        body: Option<Body>,
    ) -> Result<Request> {
        let client = self.client.as_ref().ok_or(StarrError::NilClient)?;
        self.build_request_with(client, method, url, params, body)
    }

    fn build_request_with(
        &self,
        client: &Client,
        method: Method,
        url: &str,
        params: Option<&QueryParams>,
        body: Option<Body>,
    ) -> Result<Request> {
        let mut target = Url::parse(url).map_err(|source| StarrError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            target.set_query(Some(&params.encode()));
        }

        let headers = self.build_headers(&method, &target, body.is_some())?;
        let mut builder = client.request(method.clone(), target).headers(headers);
        if !self.timeout.is_zero() {
            builder = builder.timeout(self.timeout);
        }
        if let Some((user, pass)) = self.http_auth() {
            builder = builder.basic_auth(user, Some(pass));
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        builder
            .build()
            .map_err(|e| StarrError::transport(&method, url, e))
    }

    /// Send a request to an absolute URL and check the response status.
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: &str,
        params: Option<&QueryParams>,
        body: Option<Body>,
    ) -> Result<Response> {
        let client = self.client.as_ref().ok_or(StarrError::NilClient)?;
        let response = self.send(client, method.clone(), url, params, body).await?;
        check_response(&method, response).await
    }

    /// Client used for the login POST.
    pub(crate) fn login_client(&self) -> Result<&Client> {
        self.login_client.as_ref().ok_or(StarrError::NilClient)
    }

    /// Send a request through `client` and record its cookies. The status is
    /// left for the caller to check.
    pub(crate) async fn send(
        &self,
        client: &Client,
        method: Method,
        url: &str,
        params: Option<&QueryParams>,
        body: Option<Body>,
    ) -> Result<Response> {
        let request = self.build_request_with(client, method.clone(), url, params, body)?;
        let target = request.url().clone();

        let response = client
            .execute(request)
            .await
            .map_err(|e| StarrError::transport(&method, &target, e))?;

        self.session.store_cookies(&response);
        debug!(%method, url = %target, status = %response.status(), "Request completed");

        Ok(response)
    }

    /// Make a request to `path` under the API prefix.
    ///
    /// Non-2xx responses come back as [`StarrError::Status`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<Body>,
    ) -> Result<Response> {
        self.execute(method, &self.api_url(path), params, body).await
    }

    pub async fn get(&self, path: &str, params: Option<&QueryParams>) -> Result<Response> {
        self.request(Method::GET, path, params, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<Body>,
    ) -> Result<Response> {
        self.request(Method::POST, path, params, body).await
    }

    pub async fn put(
        &self,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<Body>,
    ) -> Result<Response> {
        self.request(Method::PUT, path, params, body).await
    }

    pub async fn delete(&self, path: &str, params: Option<&QueryParams>) -> Result<Response> {
        self.request(Method::DELETE, path, params, None).await
    }

    /// GET `path` and decode the JSON body into `output`.
    pub async fn get_into<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
        output: &mut T,
    ) -> Result<()> {
        decode_into(Some(output), self.get(path, params).await).await
    }

    pub async fn post_into<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<Body>,
        output: &mut T,
    ) -> Result<()> {
        decode_into(Some(output), self.post(path, params, body).await).await
    }

    pub async fn put_into<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<Body>,
        output: &mut T,
    ) -> Result<()> {
        decode_into(Some(output), self.put(path, params, body).await).await
    }

    pub async fn delete_into<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&QueryParams>,
        output: &mut T,
    ) -> Result<()> {
        decode_into(Some(output), self.delete(path, params).await).await
    }
}

/// Builder for [`StarrClient`].
#[derive(Debug, Clone)]
pub struct StarrClientBuilder {
    url: String,
    api_key: String,
    http_user: String,
    http_pass: String,
    username: String,
    password: String,
    timeout: Duration,
    verify_ssl: bool,
    client: ClientChoice,
}

#[derive(Debug, Clone)]
enum ClientChoice {
    Default,
    Injected(Client),
    Missing,
}

impl StarrClientBuilder {
    fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: String::new(),
            http_user: String::new(),
            http_pass: String::new(),
            username: String::new(),
            password: String::new(),
            timeout: DEFAULT_TIMEOUT,
            verify_ssl: true,
            client: ClientChoice::Default,
        }
    }

    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Basic-auth credentials for a proxy in front of the server.
    #[must_use]
    pub fn http_auth(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.http_user = user.into();
        self.http_pass = pass.into();
        self
    }

    /// Credentials for form login, see [`StarrClient::login`].
    #[must_use]
    pub fn login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Verify TLS certificates of the built-in clients. An injected client
    /// keeps its own setting; the login client built next to it uses this one.
    #[must_use]
    pub const fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Use `client` for every request instead of building one.
    ///
    /// [`StarrClient::login`] still goes through a client of its own that
    /// does not follow redirects, since the session cookie is set on the
    /// login redirect.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = ClientChoice::Injected(client);
        self
    }

    /// Leave the client unset; requests then fail with [`StarrError::NilClient`].
    #[must_use]
    pub fn without_client(mut self) -> Self {
        self.client = ClientChoice::Missing;
        self
    }

    pub fn build(self) -> Result<StarrClient> {
        let (client, login_client) = match self.client {
            ClientChoice::Default => {
                let client = default_http_client(self.timeout, self.verify_ssl)?;
                (Some(client.clone()), Some(client))
            }
            ClientChoice::Injected(client) => {
                let login_client = default_http_client(self.timeout, self.verify_ssl)?;
                (Some(client), Some(login_client))
            }
            ClientChoice::Missing => (None, None),
        };

        Ok(StarrClient {
            url: self.url.trim_end_matches('/').to_string(),
            api_key: self.api_key,
            http_user: self.http_user,
            http_pass: self.http_pass,
            username: self.username,
            password: self.password,
            timeout: self.timeout,
            client,
            login_client,
            session: Arc::new(Session::new()),
        })
    }
}
