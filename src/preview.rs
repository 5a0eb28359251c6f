//! Link preview scraping for the unauthenticated `/preview` endpoint.
//!
//! Fetches an arbitrary URL and pattern-searches the HTML for Open Graph
//! metadata. Extraction is best effort: a tag that is missing or oddly
//! shaped yields an empty string, never an error.

use crate::fetch::{FetchRequest, Fetcher};
use crate::http::{GateRequest, GateResponse, Method};
use crate::proxy::GateError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Path prefix served without authentication.
pub const PREVIEW_PREFIX: &str = "/preview";

const PREVIEW_USER_AGENT: &str = "Mozilla/5.0 (compatible; BlockUnblockBot/1.0)";

static OG_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+property="og:title"\s+content="([^"]*)""#).expect("valid pattern")
});
static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<title>([^<]*)</title>").expect("valid pattern"));
static OG_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+property="og:description"\s+content="([^"]*)""#)
        .expect("valid pattern")
});
static META_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+name="description"\s+content="([^"]*)""#).expect("valid pattern")
});
static OG_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+property="og:image"\s+content="([^"]*)""#).expect("valid pattern")
});

/// Scraped metadata returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPreview {
    pub title: String,
    pub description: String,
    pub image: String,
    pub url: String,
}

fn first_capture(html: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract Open Graph metadata from `html`, falling back to the plain
/// title element and the standard description meta tag.
pub fn extract_preview(html: &str, url: &str) -> LinkPreview {
    let title = first_capture(html, &OG_TITLE)
        .or_else(|| first_capture(html, &TITLE_TAG))
        .unwrap_or_default();
    let description = first_capture(html, &OG_DESCRIPTION)
        .or_else(|| first_capture(html, &META_DESCRIPTION))
        .unwrap_or_default();
    let image = first_capture(html, &OG_IMAGE).unwrap_or_default();

    LinkPreview {
        title,
        description,
        image,
        url: url.to_string(),
    }
}

/// Handle `GET /preview?url=...`.
///
/// The outbound request carries only a descriptive user agent; the admin
/// token must never travel to the arbitrary target.
pub async fn fetch_preview(
    fetcher: &dyn Fetcher,
    request: &GateRequest,
) -> Result<GateResponse, GateError> {
    let target_url = request
        .query_param("url")
        .filter(|url| !url.is_empty())
        .ok_or_else(GateError::missing_parameter)?;

    tracing::debug!(url = %target_url, "fetching link preview");

    let outbound =
        FetchRequest::new(Method::Get, &target_url).header("User-Agent", PREVIEW_USER_AGENT);
    let response = fetcher
        .send(outbound)
        .await
        .map_err(|e| GateError::preview_fetch(e.to_string()))?;

    // The target's status is irrelevant; whatever HTML came back gets
    // scraped, and misses turn into empty fields.
    let preview = extract_preview(&response.text(), &target_url);
    Ok(GateResponse::json(&preview)?)
}
