// src/core/scanner/page_fetcher.rs

use crate::core::models::{SavedAsset, TaskResult};
use crate::core::task::{probe_loop, CancellationToken, EventSink};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

pub const DEFAULT_DOWNLOAD_DIR: &str = "blackbird_download";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const INDEX_FILE: &str = "index.html";

const USER_AGENT: &str = "Blackbird/0.1";

static STYLESHEET_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"link[rel~="stylesheet"]"#).unwrap());
static SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());
static IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Downloads a page into a folder and optionally every stylesheet, script
/// and image it references.
#[derive(Debug, Clone)]
pub struct PageFetchTask {
    pub url: String,
    pub retrieve_assets: bool,
    pub folder: PathBuf,
    pub timeout: Duration,
}

impl PageFetchTask {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retrieve_assets: true,
            folder: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_assets(mut self, retrieve_assets: bool) -> Self {
        self.retrieve_assets = retrieve_assets;
        self
    }

    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches the page, saves it as `index.html`, reports the assets it
    /// links to and downloads them if asked to.
    ///
    /// Only a failure to get or save the page itself ends the task with
    /// `failed`; asset errors are reported one by one and the task still
    /// finishes normally.
    pub async fn run(self, sink: &EventSink, token: &CancellationToken) {
        info!(url = %self.url, assets = self.retrieve_assets, folder = %self.folder.display(), "Starting page fetch.");

        let client = match reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "Failed to build HTTP client for page fetch.");
                sink.failed(format!("Failed to build HTTP client: {}", e)).await;
                return;
            }
        };

        let base = match Url::parse(&self.url) {
            Ok(url) => url,
            Err(e) => {
                error!(url = %self.url, error = %e, "Invalid page URL.");
                sink.failed(format!("Invalid URL '{}': {}", self.url, e)).await;
                return;
            }
        };

        let body = match fetch_bytes(&client, base.as_str()).await {
            Ok(body) => body,
            Err(reason) => {
                error!(url = %base, reason = %reason, "Page fetch failed.");
                sink.failed(reason).await;
                return;
            }
        };

        if let Err(e) = save_page(&self.folder, &body).await {
            error!(folder = %self.folder.display(), error = %e, "Could not save page.");
            sink.failed(format!("Could not write {}: {}", INDEX_FILE, e)).await;
            return;
        }

        let html = String::from_utf8_lossy(&body);
        let assets = extract_assets(&html, &base);
        info!(count = %assets.len(), "Extracted asset references.");
        sink.assets_found(assets.clone()).await;

        let saved = if self.retrieve_assets {
            let client = &client;
            let folder = self.folder.as_path();
            probe_loop(assets, Duration::ZERO, token, sink, |asset| async move {
                download_asset(client, folder, asset, sink).await
            })
            .await
        } else {
            Vec::new()
        };

        let folder = absolute_folder(&self.folder).await;
        info!(folder = %folder.display(), saved = %saved.len(), stopped = token.is_stopped(), "Page fetch finished.");
        sink.finished(TaskResult::Download { folder, saved }).await;
    }
}

/// GETs `url` and returns the body, treating non-2xx statuses as errors.
async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("HTTP request failed: {}", e))?;

    let status = response.status();
    debug!(url, status = %status, "Received HTTP response.");
    if !status.is_success() {
        return Err(format!("HTTP request failed with status {}", status));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("Failed to read response body: {}", e))?;
    Ok(bytes.to_vec())
}

async fn save_page(folder: &Path, body: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(folder).await?;
    tokio::fs::write(folder.join(INDEX_FILE), body).await
}

/// Downloads one asset into `folder`. Failures are reported on the sink and
/// turn into `None`.
async fn download_asset(
    client: &reqwest::Client,
    folder: &Path,
    asset: String,
    sink: &EventSink,
) -> Option<SavedAsset> {
    let result = async {
        let url = Url::parse(&asset).map_err(|e| format!("Invalid asset URL: {}", e))?;
        let bytes = fetch_bytes(client, url.as_str()).await?;
        let path = folder.join(asset_filename(&url));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| format!("Could not write {}: {}", path.display(), e))?;
        Ok::<PathBuf, String>(path)
    }
    .await;

    match result {
        Ok(path) => {
            info!(url = %asset, path = %path.display(), "Saved asset.");
            Some(SavedAsset { url: asset, path })
        }
        Err(reason) => {
            warn!(url = %asset, reason = %reason, "Asset download failed.");
            sink.asset_failed(asset, reason).await;
            None
        }
    }
}

async fn absolute_folder(folder: &Path) -> PathBuf {
    match tokio::fs::canonicalize(folder).await {
        Ok(path) => path,
        Err(_) => std::path::absolute(folder).unwrap_or_else(|_| folder.to_path_buf()),
    }
}

// --- HTML Extraction ---

/// Collects raw asset references from `html`: stylesheet `href`s first, then
/// script `src`s, then image `src`s, each in document order. Elements without
/// the attribute (or with an empty one) are skipped.
pub fn extract_references(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut references = Vec::new();

    let groups: [(&Selector, &str); 3] = [
        (&*STYLESHEET_SELECTOR, "href"),
        (&*SCRIPT_SELECTOR, "src"),
        (&*IMAGE_SELECTOR, "src"),
    ];
    for (selector, attribute) in groups {
        references.extend(
            document
                .select(selector)
                .filter_map(|el| el.value().attr(attribute))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(String::from),
        );
    }

    debug!(count = %references.len(), "Collected raw asset references.");
    references
}

/// Resolves `references` against `base` and drops duplicates, keeping the
/// first occurrence.
pub fn resolve_references<I, S>(base: &Url, references: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for reference in references {
        let reference = reference.as_ref();
        match base.join(reference) {
            Ok(url) => {
                let url = String::from(url);
                if seen.insert(url.clone()) {
                    resolved.push(url);
                }
            }
            Err(e) => warn!(reference, error = %e, "Skipping unresolvable asset reference."),
        }
    }

    resolved
}

/// The absolute, de-duplicated asset URLs referenced by a page.
pub fn extract_assets(html: &str, base: &Url) -> Vec<String> {
    resolve_references(base, extract_references(html))
}

/// The flat file name an asset is stored under: the URL path without its
/// leading separator and with the remaining separators turned into `_`. An
/// empty path falls back to the host name.
///
/// Different URLs can map to the same name (query strings are ignored, for
/// one); the later download then overwrites the earlier.
pub fn asset_filename(url: &Url) -> String {
    let path = url.path().trim_start_matches(['/', '\\']);
    let name = if path.is_empty() {
        url.host_str().unwrap_or("asset")
    } else {
        path
    };
    name.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html>
  <head>
    <link rel="stylesheet" href="css/site.css">
    <link rel="icon" href="favicon.ico">
    <link rel="stylesheet">
    <script src="a.js"></script>
    <script>console.log("inline")</script>
  </head>
  <body>
    <img src="/img/logo.png">
    <img alt="no source">
    <script src="a.js"></script>
    <script src="https://cdn.example.net/lib.js"></script>
    <script src="a.js"></script>
  </body>
</html>"#;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post.html").unwrap()
    }

    #[test]
    fn references_come_out_grouped_by_kind() {
        assert_eq!(
            extract_references(PAGE),
            vec![
                "css/site.css",
                "a.js",
                "a.js",
                "https://cdn.example.net/lib.js",
                "a.js",
                "/img/logo.png",
            ]
        );
    }

    #[test]
    fn assets_are_absolute_and_unique() {
        assert_eq!(
            extract_assets(PAGE, &base()),
            vec![
                "https://example.com/blog/css/site.css",
                "https://example.com/blog/a.js",
                "https://cdn.example.net/lib.js",
                "https://example.com/img/logo.png",
            ]
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        assert_eq!(extract_assets(PAGE, &base()), extract_assets(PAGE, &base()));
    }

    #[test]
    fn stylesheet_rel_may_hold_several_tokens() {
        let html = r#"<link rel="preload stylesheet" href="x.css"><link rel="preload" href="y.css">"#;
        assert_eq!(extract_references(html), vec!["x.css"]);
    }

    #[test]
    fn parent_relative_reference_resolves() {
        let base = Url::parse("https://example.com/a/").unwrap();
        assert_eq!(resolve_references(&base, ["../b.css"]), vec!["https://example.com/b.css"]);
    }

    #[test]
    fn empty_page_has_no_assets() {
        assert!(extract_assets("<html><body>hi</body></html>", &base()).is_empty());
    }

    #[test]
    fn filename_flattens_path() {
        let url = Url::parse("https://example.com/js/app.min.js").unwrap();
        assert_eq!(asset_filename(&url), "js_app.min.js");
    }

    #[test]
    fn filename_ignores_query_and_falls_back_to_host() {
        let url = Url::parse("https://example.com/style.css?v=3").unwrap();
        assert_eq!(asset_filename(&url), "style.css");
        let root = Url::parse("https://cdn.example.net/").unwrap();
        assert_eq!(asset_filename(&root), "cdn.example.net");
    }

    #[test]
    fn distinct_urls_can_collide() {
        let a = Url::parse("https://example.com/a/b.js").unwrap();
        let b = Url::parse("https://other.example/a_b.js").unwrap();
        assert_eq!(asset_filename(&a), asset_filename(&b));
    }
}
