//! API path normalization

/// Fixed prefix segment every *arr API path lives under.
pub const API_PREFIX: &str = "api";

/// Build the canonical `/api/<relative>` path.
///
/// Leading and trailing slashes, empty segments and any leading `api`
/// segments supplied by the caller are discarded, so `v1/test`, `/v1/test/`
/// and `/api/api/v1/test/` all yield `/api/v1/test`.
#[must_use]
pub fn set_api_path(relative: &str) -> String {
    let mut segments = relative.split('/').filter(|s| !s.is_empty()).peekable();
    while segments.next_if_eq(&API_PREFIX).is_some() {}

    let mut path = format!("/{API_PREFIX}");
    for segment in segments {
        path.push('/');
        path.push_str(segment);
    }
    path
}

/// Join a base URL and a relative API path.
#[must_use]
pub fn api_url(base: &str, relative: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), set_api_path(relative))
}
