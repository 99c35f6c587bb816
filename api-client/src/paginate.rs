//! Header driven pagination.
//!
//! APIs such as Github advertise further pages with an RFC 8288 `Link` header
//! and report quota consumption with `X-RateLimit-*` headers. A [Page] keeps
//! the items from one response alongside both, so that callers can decide
//! page by page whether to continue.

use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::Serialize;

const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
const PAGE_PARAMETER: &str = "page";

/// Page selection query parameters. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    /// The page to request.
    pub page: u32,

    /// The number of items per page.
    pub per_page: u32,
}

impl ListOptions {
    /// Request a specific page.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Request the first page.
    pub fn first(per_page: u32) -> Self {
        Self::new(1, per_page)
    }
}

/// Quota information reported alongside a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Total requests allowed in the current window, if reported.
    pub limit: Option<u32>,

    /// Requests remaining in the current window.
    pub remaining: u32,

    /// When the current window resets.
    pub reset: DateTime<Utc>,
}

impl RateLimit {
    /// Read the rate limit headers from a response.
    ///
    /// Returns `None` when the remaining count or reset time is missing or
    /// can't be parsed.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_number::<u32>(headers, RATE_LIMIT_REMAINING)?;
        let reset = header_number::<i64>(headers, RATE_LIMIT_RESET)?;
        let reset = DateTime::<Utc>::from_timestamp(reset, 0)?;

        Some(Self {
            limit: header_number(headers, RATE_LIMIT_LIMIT),
            remaining,
            reset,
        })
    }
}

fn header_number<N: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<N> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// One page of results from a paginated endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items contained in this page.
    pub items: Vec<T>,

    /// The number of the next page, if the server advertised one.
    pub next: Option<u32>,

    /// Quota information reported with this page.
    pub rate: Option<RateLimit>,
}

impl<T> Page<T> {
    /// A final page holding `items`, with no rate limit information.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            next: None,
            rate: None,
        }
    }

    /// Build a page from items and the headers of the response that carried them.
    pub fn from_headers(items: Vec<T>, headers: &HeaderMap) -> Self {
        Self {
            items,
            next: next_page(headers),
            rate: RateLimit::from_headers(headers),
        }
    }

    /// Set the next page number.
    pub fn with_next(mut self, next: Option<u32>) -> Self {
        self.next = next;
        self
    }

    /// Set the rate limit information.
    pub fn with_rate(mut self, rate: RateLimit) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Is this the last page?
    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Find the page number of the `rel="next"` target in a `Link` header.
pub fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get_all(http::header::LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|link| {
            let (target, params) = link.trim().split_once(';')?;
            let is_next = params.split(';').any(|param| {
                param
                    .trim()
                    .strip_prefix("rel=")
                    .map(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
                    .unwrap_or(false)
            });

            if !is_next {
                return None;
            }

            let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
            let url = url::Url::parse(target).ok()?;
            url.query_pairs()
                .find(|(key, _)| key == PAGE_PARAMETER)?
                .1
                .parse()
                .ok()
        })
}
