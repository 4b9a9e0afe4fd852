// Fetch of the Google-Sheets CSV export, behind a read-through cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use snafu::prelude::*;

use crate::pipeline::*;

/// The export URL patterns, tried in order. A sheet shared as "anyone with
/// the link can view" answers on the first one; older sharing setups only
/// answer on the gviz endpoint.
fn export_urls(sheet_id: &str) -> Vec<String> {
    vec![
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid=0",
            sheet_id
        ),
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv",
            sheet_id
        ),
        format!(
            "https://docs.google.com/spreadsheets/d/{}/gviz/tq?tqx=out:csv",
            sheet_id
        ),
    ]
}

// The export endpoints answer 401 to clients without a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    digest: String,
    fetched_at: Instant,
}

/// Read-through cache for fetched sheet bodies, keyed by sheet id. The
/// cache is owned by the caller and passed down explicitly; entries carry
/// the SHA-256 digest of their content and expire after the TTL. A new
/// load within the TTL reuses the cached body, a manual refresh calls
/// `invalidate` first.
#[derive(Debug)]
pub struct SourceCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl SourceCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    pub fn new(ttl: Duration) -> SourceCache {
        SourceCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// The cached body for a sheet, if present and not expired.
    pub fn cached(&self, sheet_id: &str) -> Option<&str> {
        self.entries
            .get(sheet_id)
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.body.as_str())
    }

    /// Content digest of the cached body, expired or not.
    pub fn digest(&self, sheet_id: &str) -> Option<&str> {
        self.entries.get(sheet_id).map(|e| e.digest.as_str())
    }

    /// Stores a body and returns its content digest. Also the seeding hook
    /// for tests and for bodies obtained outside the fetcher.
    pub fn insert(&mut self, sheet_id: &str, body: String) -> String {
        let digest = sha256::digest(body.as_str());
        self.entries.insert(
            sheet_id.to_string(),
            CacheEntry {
                body,
                digest: digest.clone(),
                fetched_at: Instant::now(),
            },
        );
        digest
    }

    pub fn invalidate(&mut self, sheet_id: &str) {
        self.entries.remove(sheet_id);
    }
}

/// Fetches the CSV export of a sheet, going through the cache. Every URL
/// pattern is tried in order; the first non-empty success wins. All
/// failing is a load error carrying remediation text.
pub fn fetch_sheet_csv(cache: &mut SourceCache, sheet_id: &str) -> AnalysisResult<String> {
    if let Some(body) = cache.cached(sheet_id) {
        debug!("fetch_sheet_csv: cache hit for {}", sheet_id);
        return Ok(body.to_string());
    }

    let client = reqwest::blocking::Client::new();
    for url in export_urls(sheet_id) {
        info!("fetch_sheet_csv: trying {}", url);
        match fetch_one(&client, &url) {
            Ok(body) if !body.trim().is_empty() => {
                let digest = cache.insert(sheet_id, body.clone());
                info!("fetch_sheet_csv: fetched {} bytes, digest {}", body.len(), digest);
                return Ok(body);
            }
            Ok(_) => {
                warn!("fetch_sheet_csv: {} answered with an empty body", url);
            }
            Err(e) => {
                warn!("fetch_sheet_csv: {} failed: {}", url, e);
            }
        }
    }
    SheetUnavailableSnafu { sheet_id }.fail()
}

fn fetch_one(client: &reqwest::blocking::Client, url: &str) -> AnalysisResult<String> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .context(HttpFetchSnafu { url })?;
    let response = response.error_for_status().context(HttpFetchSnafu { url })?;
    let bytes = response.bytes().context(HttpFetchSnafu { url })?;
    // UTF-8 first, Latin-1 as the fallback for legacy exports. The byte to
    // char identity is exactly the Latin-1 decode.
    match std::str::from_utf8(&bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_serves_fresh_entries() {
        let mut cache = SourceCache::new(SourceCache::DEFAULT_TTL);
        assert!(cache.cached("sheet-1").is_none());
        let digest = cache.insert("sheet-1", "a,b\n1,2\n".to_string());
        assert_eq!(cache.cached("sheet-1"), Some("a,b\n1,2\n"));
        assert_eq!(cache.digest("sheet-1"), Some(digest.as_str()));
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let mut cache = SourceCache::new(Duration::ZERO);
        cache.insert("sheet-1", "a,b\n".to_string());
        assert!(cache.cached("sheet-1").is_none());
        // The digest stays queryable for invalidation decisions.
        assert!(cache.digest("sheet-1").is_some());
    }

    #[test]
    fn invalidation_drops_the_entry() {
        let mut cache = SourceCache::new(SourceCache::DEFAULT_TTL);
        cache.insert("sheet-1", "a,b\n".to_string());
        cache.invalidate("sheet-1");
        assert!(cache.cached("sheet-1").is_none());
        assert!(cache.digest("sheet-1").is_none());
    }

    #[test]
    fn digest_is_content_addressed() {
        let mut cache = SourceCache::new(SourceCache::DEFAULT_TTL);
        let d1 = cache.insert("s1", "same".to_string());
        let d2 = cache.insert("s2", "same".to_string());
        let d3 = cache.insert("s3", "different".to_string());
        assert_eq!(d1, d2);
        assert_ne!(d1, d3);
    }

    #[test]
    fn url_patterns_cover_the_known_endpoints() {
        let urls = export_urls("abc123");
        assert_eq!(urls.len(), 3);
        assert!(urls[0].contains("/export?format=csv&gid=0"));
        assert!(urls[2].contains("gviz/tq?tqx=out:csv"));
    }
}
