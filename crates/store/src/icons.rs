//! Site icon harvesting
//!
//! Collects every remotely hosted site icon referenced by a navigation
//! document and mirrors them into a local directory as `{domain}.ico`.

use std::path::Path;
use std::time::Duration;

use catnav_types::NavigationDocument;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ContentStoreError, Result};
use crate::http::{self, HttpExecutor, HttpRequest};

const FAVICON_MARKER: &str = "/favicon/";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSource {
    pub url: String,
    pub domain: String,
    pub file_name: String,
    pub site_name: String,
    pub site_url: String,
}

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub timeout: Duration,
    /// Pause between consecutive network requests
    pub delay: Duration,
    /// Bodies smaller than this are treated as broken icons
    pub min_size: usize,
    pub user_agent: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            delay: Duration::from_millis(500),
            min_size: 100,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IconReport {
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
    /// File name and the reason it could not be saved
    pub failed: Vec<(String, String)>,
}

impl IconReport {
    pub fn total(&self) -> usize {
        self.downloaded.len() + self.skipped.len() + self.failed.len()
    }
}

/// Every site icon hosted over http(s), in document order.
pub fn collect_remote_icons(document: &NavigationDocument) -> Vec<IconSource> {
    let mut sources = Vec::new();

    for category in &document.categories {
        for site in category.sites.iter().filter(|s| s.has_remote_icon()) {
            let Some(domain) = icon_domain(site.icon(), site.url()) else {
                warn!(site = %site.name(), icon = %site.icon(), "cannot derive a file name for icon");
                continue;
            };

            sources.push(IconSource {
                url: site.icon().to_string(),
                file_name: format!("{}.ico", domain),
                domain,
                site_name: site.name().to_string(),
                site_url: site.url().to_string(),
            });
        }
    }

    sources
}

/// `icon.example.com/favicon/github.com` names the domain directly; anything
/// else falls back to the host of the site itself.
fn icon_domain(icon_url: &str, site_url: &str) -> Option<String> {
    let domain = match icon_url.rsplit_once(FAVICON_MARKER) {
        Some((_, domain)) => domain.to_string(),
        None => Url::parse(site_url).ok()?.host_str()?.to_string(),
    };

    let usable = !domain.is_empty()
        && !domain.contains(['/', '\\'])
        && domain != "."
        && domain != "..";
    usable.then_some(domain)
}

/// Download `sources` into `output_dir`, skipping files that already exist.
///
/// Only failing to create the output directory is fatal. Individual icons
/// that cannot be fetched or written are recorded in the report.
pub async fn download_icons(
    executor: &dyn HttpExecutor,
    sources: &[IconSource],
    output_dir: &Path,
    options: &DownloadOptions,
) -> Result<IconReport> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| ContentStoreError::IoOperation {
            operation: "create icon directory",
            path: output_dir.to_path_buf(),
            source,
        })?;

    let mut report = IconReport::default();
    let mut fetched_any = false;

    for (index, icon) in sources.iter().enumerate() {
        let target = output_dir.join(&icon.file_name);

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            debug!(file = %icon.file_name, "icon already present");
            report.skipped.push(icon.file_name.clone());
            continue;
        }

        if fetched_any && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
        fetched_any = true;

        debug!(
            index = index + 1,
            total = sources.len(),
            site = %icon.site_name,
            "downloading icon"
        );
        match fetch_icon(executor, icon, &target, options).await {
            Ok(size) => {
                debug!(file = %icon.file_name, size, "icon saved");
                report.downloaded.push(icon.file_name.clone());
            }
            Err(reason) => {
                warn!(file = %icon.file_name, %reason, "icon download failed");
                report.failed.push((icon.file_name.clone(), reason));
            }
        }
    }

    info!(
        downloaded = report.downloaded.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "icon harvest finished"
    );
    Ok(report)
}

async fn fetch_icon(
    executor: &dyn HttpExecutor,
    icon: &IconSource,
    target: &Path,
    options: &DownloadOptions,
) -> std::result::Result<usize, String> {
    let request = HttpRequest::get(icon.url.as_str())
        .header("User-Agent", options.user_agent.as_str())
        .header("Accept", IMAGE_ACCEPT);

    let response = http::execute_with_timeout(executor, request, "downloading icon", options.timeout)
        .await
        .map_err(|e| e.to_string())?;

    if !response.is_success() {
        return Err(format!("HTTP {}: {}", response.status, response.reason()));
    }
    if response.body.len() < options.min_size {
        return Err(format!(
            "file too small to be an icon ({} bytes)",
            response.body.len()
        ));
    }

    tokio::fs::write(target, &response.body)
        .await
        .map_err(|e| format!("could not write {}: {}", target.display(), e))?;
    Ok(response.body.len())
}
