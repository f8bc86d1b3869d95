//! Response status checks and JSON decoding
//!
//! Responses are consumed by value, so each body is read or released exactly
//! once whichever branch is taken.

use reqwest::header::LOCATION;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;

use crate::error::{parse_error_message, Result, StarrError, MAX_RESPONSE_SIZE};

/// Body bytes read up to [`MAX_RESPONSE_SIZE`].
pub(crate) struct CappedBody {
    pub bytes: Vec<u8>,
    /// Bytes seen when the cap was crossed; reading stops there.
    pub exceeded_at: Option<u64>,
}

/// Read the body of `response`, never buffering more than
/// [`MAX_RESPONSE_SIZE`] bytes.
pub(crate) async fn read_capped(mut response: Response) -> Result<CappedBody> {
    let url = response.url().to_string();
    let mut bytes = Vec::new();

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| StarrError::transport("read body", &url, e))?
    {
        let seen = bytes.len() + chunk.len();
        if seen > MAX_RESPONSE_SIZE {
            let room = MAX_RESPONSE_SIZE - bytes.len();
            bytes.extend_from_slice(&chunk[..room]);
            return Ok(CappedBody {
                bytes,
                exceeded_at: Some(seen as u64),
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(CappedBody {
        bytes,
        exceeded_at: None,
    })
}

/// Turn a non-2xx response into [`StarrError::Status`].
///
/// The error keeps the body, the message the server put in it (if any) and
/// the `Location` header so redirects can be inspected by the caller. Bodies
/// over [`MAX_RESPONSE_SIZE`] are truncated.
pub async fn check_response(method: &Method, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let capped = read_capped(response).await?;
    let body = String::from_utf8_lossy(&capped.bytes).into_owned();

    Err(StarrError::Status {
        method: method.to_string(),
        url,
        status,
        message: parse_error_message(&body),
        body,
        location,
    })
}

/// Decode a JSON success body, refusing anything over [`MAX_RESPONSE_SIZE`].
///
/// A declared `Content-Length` over the cap fails before any byte is read.
pub async fn json_with_limit<T: DeserializeOwned>(response: Response) -> Result<T> {
    let url = response.url().to_string();
    if let Some(size) = response.content_length().filter(|&len| len > MAX_RESPONSE_SIZE as u64) {
        return Err(StarrError::ResponseTooLarge { url, size });
    }

    let capped = read_capped(response).await?;
    if let Some(size) = capped.exceeded_at {
        return Err(StarrError::ResponseTooLarge { url, size });
    }

    serde_json::from_slice(&capped.bytes).map_err(|source| StarrError::Decode { url, source })
}

/// Decode the outcome of a request into `output`.
///
/// A prior error is handed back untouched. A missing `output` is a usage
/// error; the response is released without reading it.
pub async fn decode_into<T: DeserializeOwned>(
    output: Option<&mut T>,
    response: Result<Response>,
) -> Result<()> {
    let response = response?;

    let Some(output) = output else {
        let url = response.url().to_string();
        drop(response);
        return Err(StarrError::NilOutput { url });
    };

    *output = json_with_limit(response).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Tag {
        id: i64,
        label: String,
    }

    async fn fetch(server: &MockServer, route: &str) -> Response {
        reqwest::get(format!("{}{route}", server.uri())).await.unwrap()
    }

    #[tokio::test]
    async fn test_decode_into_prior_error_unchanged() {
        let mut out = Tag {
            id: 7,
            label: "keep".to_string(),
        };
        let err = decode_into(Some(&mut out), Err(StarrError::NilClient))
            .await
            .unwrap_err();
        assert!(matches!(err, StarrError::NilClient));
        assert_eq!(out.id, 7);
        assert_eq!(out.label, "keep");
    }

    #[tokio::test]
    async fn test_decode_into_missing_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/tag/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":1,"label":"hd"}"#))
            .mount(&server)
            .await;

        let response = fetch(&server, "/api/v3/tag/1").await;
        let err = decode_into::<Tag>(None, Ok(response)).await.unwrap_err();
        assert!(matches!(err, StarrError::NilOutput { ref url } if url.ends_with("/api/v3/tag/1")));
        assert!(err.is_usage());
    }

    #[tokio::test]
    async fn test_decode_into_populates_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/tag/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":1,"label":"hd"}"#))
            .mount(&server)
            .await;

        let mut out = Tag::default();
        decode_into(Some(&mut out), Ok(fetch(&server, "/api/v3/tag/1").await))
            .await
            .unwrap();
        assert_eq!(
            out,
            Tag {
                id: 1,
                label: "hd".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_decode_into_bad_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let mut out = Tag::default();
        let err = decode_into(Some(&mut out), Ok(fetch(&server, "/api/v3/tag").await))
            .await
            .unwrap_err();
        assert!(matches!(err, StarrError::Decode { .. }));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_check_response_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"message":"NotFound","description":"no series 9"}"#),
            )
            .mount(&server)
            .await;

        let response = fetch(&server, "/api/v3/series/9").await;
        let err = check_response(&Method::GET, response).await.unwrap_err();
        assert!(err.is_not_found());
        match err {
            StarrError::Status { message, body, .. } => {
                assert_eq!(message.as_deref(), Some("NotFound (no series 9)"));
                assert!(body.contains("no series 9"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_check_response_truncates_oversized_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(MAX_RESPONSE_SIZE + 100)))
            .mount(&server)
            .await;

        let response = fetch(&server, "/api/v3/log").await;
        let err = check_response(&Method::GET, response).await.unwrap_err();
        match err {
            StarrError::Status { status, body, message, .. } => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body.len(), MAX_RESPONSE_SIZE);
                assert!(message.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_oversized_success_body_is_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(MAX_RESPONSE_SIZE + 1)))
            .mount(&server)
            .await;

        let mut out = serde_json::Value::Null;
        let err = decode_into(Some(&mut out), Ok(fetch(&server, "/api/v3/log").await))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StarrError::ResponseTooLarge { size, .. } if size == MAX_RESPONSE_SIZE as u64 + 1
        ));
    }

    #[tokio::test]
    async fn test_read_capped_small_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let capped = read_capped(fetch(&server, "/ping").await).await.unwrap();
        assert_eq!(capped.bytes, b"ok");
        assert!(capped.exceeded_at.is_none());
    }

    #[tokio::test]
    async fn test_check_response_passes_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = fetch(&server, "/api/v3/command/3").await;
        let response = check_response(&Method::GET, response).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    }
}
