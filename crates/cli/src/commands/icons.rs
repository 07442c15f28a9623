use std::path::PathBuf;
use std::time::Duration;

use catnav_store::{ContentStore, DownloadOptions, collect_remote_icons, download_icons};
use eyre::Result;

use crate::commands::document::load_document;
use crate::config::IconsConfig;

pub async fn handle_icons_command(
    store: &ContentStore,
    config: &IconsConfig,
    out: Option<PathBuf>,
    delay_ms: Option<u64>,
    fallback: bool,
) -> Result<()> {
    let output_dir = out.unwrap_or_else(|| PathBuf::from(&config.output_dir));
    let delay = delay_ms.map(Duration::from_millis).unwrap_or_else(|| config.delay());

    let document = load_document(store, fallback).await?;
    let sources = collect_remote_icons(&document);
    println!("🔍 Found {} remote icons", sources.len());

    if sources.is_empty() {
        return Ok(());
    }

    let options = DownloadOptions {
        delay,
        ..Default::default()
    };
    let executor = store.executor();
    let report = download_icons(executor.as_ref(), &sources, &output_dir, &options).await?;

    println!("\n📊 Download finished");
    println!("  ✅ Downloaded: {}", report.downloaded.len());
    println!("  ⏭️  Skipped (already present): {}", report.skipped.len());
    println!("  ❌ Failed: {}", report.failed.len());
    for (file, reason) in &report.failed {
        println!("    - {}: {}", file, reason);
    }
    println!("📁 Files saved in: {}", output_dir.display());

    Ok(())
}
