//! Chocolatey OData (Atom) feed registry for the chocolatey channel

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::PRODUCT_NAME;
use crate::version::error::FetchError;
use crate::version::fetcher::Fetcher;
use crate::version::model::{ChocolateyVersion, VersionRecord};
use crate::version::registries::{check_status, http_client};

/// Default base URL for the Chocolatey community feed
pub const DEFAULT_BASE_URL: &str = "https://community.chocolatey.org/api/v2";

static ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry[\s>].*?</entry>").expect("Valid regex"));

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:\w+:)?Version(?:\s[^>]*)?>([^<]*)</(?:\w+:)?Version>").expect("Valid regex")
});

static PRERELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:\w+:)?IsPrerelease(?:\s[^>]*)?>([^<]*)</(?:\w+:)?IsPrerelease>")
        .expect("Valid regex")
});

static NEXT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<link\b[^>]*\brel="next"[^>]*>"#).expect("Valid regex"));

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bhref="([^"]*)""#).expect("Valid regex"));

pub struct ChocolateyFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl ChocolateyFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Make a `rel="next"` link absolute, upgrading to https when the feed is served over https
    fn resolve_link(&self, href: &str) -> String {
        let href = href.replace("&amp;", "&");
        let absolute = if href.starts_with("http://") || href.starts_with("https://") {
            href
        } else {
            format!("{}/{}", self.base_url, href.trim_start_matches('/'))
        };
        if self.base_url.starts_with("https://") {
            absolute.replacen("http://", "https://", 1)
        } else {
            absolute
        }
    }
}

impl Default for ChocolateyFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Extract package versions from one Atom page
fn parse_entries(feed: &str) -> Vec<ChocolateyVersion> {
    ENTRY
        .find_iter(feed)
        .filter_map(|entry| {
            let entry = entry.as_str();
            let version = VERSION.captures(entry)?[1].trim().to_string();
            if version.is_empty() {
                return None;
            }
            let is_pre_release = PRERELEASE
                .captures(entry)
                .is_some_and(|captures| captures[1].trim() == "true");
            Some(ChocolateyVersion::new(version, is_pre_release))
        })
        .collect()
}

fn next_link(feed: &str) -> Option<String> {
    let link = NEXT_LINK.find(feed)?;
    HREF.captures(link.as_str())
        .map(|captures| captures[1].to_string())
        .filter(|href| !href.is_empty())
}

#[async_trait::async_trait]
impl Fetcher for ChocolateyFetcher {
    type Record = ChocolateyVersion;

    async fn fetch_all(&self) -> Result<Vec<ChocolateyVersion>, FetchError> {
        let mut url = format!(
            "{}/Packages()?%24filter=Id%20eq%20'{}'",
            self.base_url, PRODUCT_NAME
        );
        let mut versions = Vec::new();

        loop {
            debug!("Fetching Chocolatey feed: {}", url);
            let response = self.client.get(&url).send().await?;
            let response = check_status(response, PRODUCT_NAME)?;
            let feed = response.text().await.map_err(|e| {
                warn!("Failed to read Chocolatey feed: {}", e);
                FetchError::InvalidResponse(e.to_string())
            })?;

            versions.extend(parse_entries(&feed));

            match next_link(&feed) {
                Some(href) => url = self.resolve_link(&href),
                None => break,
            }
        }

        versions.sort_by_key(|v| v.number());
        Ok(versions)
    }
}
