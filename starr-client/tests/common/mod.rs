//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::time::Duration;

use starr_client::StarrClient;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "0123456789abcdef";

/// One scripted round trip: what the client must send and what the server
/// answers with.
#[derive(Debug, Clone)]
pub struct Expectation {
    pub method: &'static str,
    pub path: &'static str,
    pub body: Option<String>,
    pub status: u16,
    pub response: String,
}

impl Expectation {
    pub fn new(method: &'static str, path: &'static str) -> Self {
        Self {
            method,
            path,
            body: None,
            status: 200,
            response: String::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn respond(mut self, status: u16, response: impl Into<String>) -> Self {
        self.status = status;
        self.response = response.into();
        self
    }

    /// Mount on `server`, requiring exactly `times` matching requests.
    pub async fn mount_times(&self, server: &MockServer, times: u64) {
        let mut mock = Mock::given(method(self.method)).and(path(self.path));
        if let Some(body) = &self.body {
            mock = mock.and(body_string(body.clone()));
        }
        mock.respond_with(ResponseTemplate::new(self.status).set_body_string(self.response.clone()))
            .expect(times)
            .mount(server)
            .await;
    }

    pub async fn mount(&self, server: &MockServer) {
        self.mount_times(server, 1).await;
    }
}

pub fn api_client(server: &MockServer) -> StarrClient {
    StarrClient::new(API_KEY, server.uri(), Duration::from_secs(5)).unwrap()
}

pub fn login_client(server: &MockServer, username: &str, password: &str) -> StarrClient {
    StarrClient::builder(server.uri())
        .login(username, password)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
