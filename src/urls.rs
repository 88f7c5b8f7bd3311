//! GitHub URL conversion
//!
//! Converts between "raw" file URLs
//! (`https://raw.githubusercontent.com/<user>/<repo>/<rest>`) and "cooked"
//! browsable ones (`https://github.com/<user>/<repo>/blob/<rest>`). Cooked
//! URLs are attached to diagram clusters so they link to the schema source.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SchemaError};

const RAW_PREFIX: &str = "https://raw.githubusercontent.com/";
const COOKED_PREFIX: &str = "https://github.com/";

fn cooked_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https://github\.com/(?P<user>[a-zA-Z0-9_\-]+)/(?P<repo>[a-zA-Z0-9_\-]+)/blob/(?P<rest>.*)$")
            .expect("valid cooked URL pattern")
    })
}

fn raw_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https://raw\.githubusercontent\.com/(?P<user>[a-zA-Z0-9_\-]+)/(?P<repo>[a-zA-Z0-9_\-]+)/(?P<rest>.*)$")
            .expect("valid raw URL pattern")
    })
}

/// Convert a cooked GitHub URL to its raw form; raw URLs pass through.
pub fn to_raw_url(url: &str) -> Result<String> {
    if url.starts_with(RAW_PREFIX) {
        return Ok(url.to_string());
    }
    let caps = cooked_pattern()
        .captures(url)
        .ok_or_else(|| SchemaError::InvalidUrl(url.to_string()))?;
    Ok(format!(
        "{}{}/{}/{}",
        RAW_PREFIX, &caps["user"], &caps["repo"], &caps["rest"]
    ))
}

/// Convert a raw GitHub URL to its cooked form; cooked URLs pass through.
pub fn to_cooked_url(url: &str) -> Result<String> {
    if url.starts_with(COOKED_PREFIX) {
        return Ok(url.to_string());
    }
    let caps = raw_pattern()
        .captures(url)
        .ok_or_else(|| SchemaError::InvalidUrl(url.to_string()))?;
    Ok(format!(
        "{}{}/{}/blob/{}",
        COOKED_PREFIX, &caps["user"], &caps["repo"], &caps["rest"]
    ))
}

/// Build a cluster label -> cooked URL map from a list of schema URLs.
///
/// The key is the last path segment, e.g. `reads.avdl`. Blank lines are
/// skipped.
pub fn cluster_urls(content: &str) -> Result<BTreeMap<String, String>> {
    let mut urls = BTreeMap::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let cooked = to_cooked_url(line)?;
        let key = cooked.rsplit('/').next().unwrap_or_default().to_string();
        urls.insert(key, cooked);
    }
    Ok(urls)
}
