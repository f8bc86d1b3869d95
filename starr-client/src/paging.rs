//! Pagination parameters for list, history and queue endpoints
//!
//! A [`PageReq`] resolves to a concrete [`QueryParams`] set where every
//! unset field falls back to a default. Callers may stack extra parameters
//! on top with [`PageReq::set`] (always overwrites) and
//! [`PageReq::check_set`] (only fills unset fields).
//!
//! [`resolve_page_size`] and [`adjust_page_size`] size the pages of a
//! multi-page fetch so the loop never asks for fewer than a sane number of
//! records per round trip, nor for more than the caller wants or the
//! server holds:
//!
//! ```
//! use starr_client::paging::{adjust_page_size, resolve_page_size};
//!
//! let wanted = 120;
//! let total = 300;
//! let mut collected = 0;
//! let mut per_page = resolve_page_size(wanted, 50);
//! while collected < wanted && collected < total {
//!     collected += per_page;
//!     per_page = adjust_page_size(wanted, total, collected, per_page);
//! }
//! assert_eq!(collected, wanted);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::query::QueryParams;

/// Page size used when the caller did not pick a usable one.
pub const DEFAULT_PAGE_SIZE_LIMIT: usize = 500;
/// Default `page` parameter.
pub const DEFAULT_PAGE: usize = 1;
/// Default `pageSize` parameter.
pub const DEFAULT_PAGE_SIZE: usize = 10;
/// Default `sortKey` parameter.
pub const DEFAULT_SORT_KEY: &str = "date";

const PARAM_PAGE: &str = "page";
const PARAM_PAGE_SIZE: &str = "pageSize";
const PARAM_SORT_KEY: &str = "sortKey";
const PARAM_SORT_DIRECTION: &str = "sortDirection";
const PARAM_FILTER: &str = "eventType";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(Self::Ascending),
            "descending" | "desc" => Ok(Self::Descending),
            _ => Err(format!("invalid sort direction: {s}")),
        }
    }
}

/// Application specific event filter; `0` means no filter.
///
/// The numeric values are defined by each application (for example the
/// history event types of Sonarr and Radarr).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(pub i32);

impl Filter {
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn is_set(self) -> bool {
        self.0 > 0
    }
}

/// Page, sort and filter options for a paginated request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReq {
    pub page: usize,
    pub page_size: usize,
    pub sort_key: String,
    pub sort_dir: Option<SortDirection>,
    pub filter: Filter,
    pub extra: QueryParams,
}

impl PageReq {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, overwriting any earlier value.
    ///
    /// `page`, `pageSize`, `sortKey` and `sortDirection` (any case) map to
    /// the typed fields. An unparsable page, page size or direction resets
    /// that field to unset. Every other key becomes an extra parameter.
    pub fn set(&mut self, key: &str, value: &str) {
        match key.to_ascii_lowercase().as_str() {
            "page" => self.page = value.parse().unwrap_or(0),
            "pagesize" => self.page_size = value.parse().unwrap_or(0),
            "sortkey" => self.sort_key = value.to_string(),
            "sortdirection" => self.sort_dir = value.parse().ok(),
            _ => self.extra.set(key, value),
        }
    }

    /// Set a field only while it is still unset.
    pub fn check_set(&mut self, key: &str, value: &str) {
        match key.to_ascii_lowercase().as_str() {
            "page" if self.page == 0 => self.set(key, value),
            "pagesize" if self.page_size == 0 => self.set(key, value),
            "sortkey" if self.sort_key.is_empty() => self.set(key, value),
            "sortdirection" if self.sort_dir.is_none() => self.set(key, value),
            "page" | "pagesize" | "sortkey" | "sortdirection" => {}
            _ => {
                if self.extra.get(key).is_none_or(str::is_empty) {
                    self.extra.set(key, value);
                }
            }
        }
    }

    /// Resolve every field to a request parameter.
    #[must_use]
    pub fn params(&self) -> QueryParams {
        let mut params = QueryParams::new();

        if self.filter.is_set() {
            params.set(PARAM_FILTER, self.filter.0.to_string());
        }

        let page = if self.page > 0 { self.page } else { DEFAULT_PAGE };
        params.set(PARAM_PAGE, page.to_string());

        let page_size = if self.page_size > 0 {
            self.page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        params.set(PARAM_PAGE_SIZE, page_size.to_string());

        let sort_key = if self.sort_key.is_empty() {
            DEFAULT_SORT_KEY
        } else {
            &self.sort_key
        };
        params.set(PARAM_SORT_KEY, sort_key);

        params.set(
            PARAM_SORT_DIRECTION,
            self.sort_dir.unwrap_or_default().as_str(),
        );

        params.extend(&self.extra);
        params
    }

    #[must_use]
    pub fn encode(&self) -> String {
        self.params().encode()
    }
}

/// Pick the page size for the first page of a fetch.
///
/// `records` is how many records the caller wants in total (`0` = all).
#[must_use]
pub const fn resolve_page_size(records: usize, per_page: usize) -> usize {
    if per_page <= 1 {
        if records == 0 || records > DEFAULT_PAGE_SIZE_LIMIT {
            DEFAULT_PAGE_SIZE_LIMIT
        } else {
            records
        }
    } else if records != 0 && per_page > records {
        records
    } else {
        per_page
    }
}

/// Shrink the next page so it asks for neither more than the caller still
/// wants nor more than the server has left.
#[must_use]
pub const fn adjust_page_size(
    records: usize,
    total: usize,
    collected: usize,
    per_page: usize,
) -> usize {
    let mut per_page = per_page;

    if records > collected && per_page > records - collected {
        per_page = records - collected;
    }

    let remaining = total.saturating_sub(collected);
    if per_page > remaining {
        per_page = remaining;
    }

    per_page
}
