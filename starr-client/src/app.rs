//! Supported server applications

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StarrError;

/// The *arr applications this client can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum App {
    Lidarr,
    Prowlarr,
    Radarr,
    Readarr,
    Sonarr,
    Whisparr,
}

impl App {
    pub const ALL: [Self; 6] = [
        Self::Lidarr,
        Self::Prowlarr,
        Self::Radarr,
        Self::Readarr,
        Self::Sonarr,
        Self::Whisparr,
    ];

    /// Display name, as the applications spell themselves.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lidarr => "Lidarr",
            Self::Prowlarr => "Prowlarr",
            Self::Radarr => "Radarr",
            Self::Readarr => "Readarr",
            Self::Sonarr => "Sonarr",
            Self::Whisparr => "Whisparr",
        }
    }

    #[must_use]
    pub const fn lower(self) -> &'static str {
        match self {
            Self::Lidarr => "lidarr",
            Self::Prowlarr => "prowlarr",
            Self::Radarr => "radarr",
            Self::Readarr => "readarr",
            Self::Sonarr => "sonarr",
            Self::Whisparr => "whisparr",
        }
    }

    /// API version segment served by the application.
    #[must_use]
    pub const fn api_version(self) -> &'static str {
        match self {
            Self::Radarr | Self::Sonarr | Self::Whisparr => "v3",
            Self::Lidarr | Self::Prowlarr | Self::Readarr => "v1",
        }
    }

    /// Relative path for an endpoint under this application's API version,
    /// e.g. `App::Sonarr.api_path("series")` is `v3/series`.
    #[must_use]
    pub fn api_path(self, endpoint: &str) -> String {
        format!("{}/{}", self.api_version(), endpoint.trim_start_matches('/'))
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for App {
    type Err = StarrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|app| app.lower().eq_ignore_ascii_case(s))
            .ok_or_else(|| StarrError::Config(format!("unknown application '{s}'")))
    }
}
