// Starr Request Layer
//
// Shared HTTP plumbing for the *arr family of media managers (Sonarr, Radarr,
// Lidarr, Readarr, Prowlarr, Whisparr). Per-application endpoints and their
// JSON schemas are built on top of this crate; it only knows how to reach a
// server, authenticate, decode responses and size paginated requests.
//
// Architecture:
// - client: connection profile, request builder and transport executor
// - auth: API key / basic-auth headers and cookie session login
// - decode: status mapping and JSON decoding into caller-supplied outputs
// - paging: page/sort/filter parameters and per-page sizing

//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use starr_client::{App, PageReq, StarrClient};
//!
//! # async fn example() -> Result<(), starr_client::StarrError> {
//! let client = StarrClient::new("api-key", "http://localhost:8989", Duration::from_secs(30))?;
//!
//! let mut series: Vec<serde_json::Value> = Vec::new();
//! client.get_into(&App::Sonarr.api_path("series"), None, &mut series).await?;
//!
//! let mut history = serde_json::Value::Null;
//! let page = PageReq { page_size: 50, ..PageReq::default() };
//! client
//!     .get_into(&App::Sonarr.api_path("history"), Some(&page.params()), &mut history)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod auth;
pub mod client;
pub mod decode;
pub mod error;
pub mod logging;
pub mod paging;
pub mod path;
pub mod query;
pub mod settings;

pub use app::App;
pub use auth::Session;
pub use client::{json_body, StarrClient, StarrClientBuilder};
pub use decode::decode_into;
pub use error::{Result, StarrError};
pub use paging::{adjust_page_size, resolve_page_size, Filter, PageReq, SortDirection};
pub use path::set_api_path;
pub use query::QueryParams;
pub use settings::{parse_duration, ClientSettings};
