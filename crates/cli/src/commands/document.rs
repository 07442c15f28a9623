use std::path::Path;

use catnav_store::{ContentStore, NavigationDocument};
use eyre::{Result, WrapErr};
use tokio::fs;
use tracing::{info, warn};

/// Load the remote document, or the bundled sample when `fallback` is set
/// and the load fails.
pub async fn load_document(store: &ContentStore, fallback: bool) -> Result<NavigationDocument> {
    match store.load_navigation_document().await {
        Ok(document) => Ok(document),
        Err(e) if fallback => {
            warn!("Could not load navigation data ({}); using bundled sample", e);
            NavigationDocument::bundled().wrap_err("Bundled navigation data is invalid")
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_show_command(store: &ContentStore, fallback: bool, json: bool) -> Result<()> {
    let document = load_document(store, fallback).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("📖 {}", document.title());
    match document.file_sha() {
        Some(sha) => println!("  Revision: {}", sha),
        None => println!("  Revision: (bundled sample)"),
    }
    if let Some(engine) = document.default_search_engine() {
        println!("  Search engine: {}", engine);
    }
    println!(
        "  {} categories, {} sites",
        document.categories.len(),
        document.site_count()
    );

    for category in document.sorted_categories() {
        println!("\n{} {} ({})", category.icon(), category.name(), category.sites.len());
        for site in &category.sites {
            println!("  • {} - {}", site.name(), site.url());
        }
    }

    Ok(())
}

pub async fn handle_pull_command(store: &ContentStore, output: &Path) -> Result<()> {
    let document = store.load_navigation_document().await?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(&document)?;
    fs::write(output, content + "\n")
        .await
        .wrap_err_with(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✅ Saved {} categories ({} sites) to {}",
        document.categories.len(),
        document.site_count(),
        output.display()
    );
    Ok(())
}

pub async fn handle_push_command(store: &ContentStore, input: &Path, dry_run: bool) -> Result<()> {
    let content = fs::read_to_string(input)
        .await
        .wrap_err_with(|| format!("Failed to read {}", input.display()))?;
    let document: NavigationDocument = serde_json::from_str(&content)
        .wrap_err_with(|| format!("{} is not a valid navigation document", input.display()))?;

    if dry_run {
        println!(
            "Would commit {} categories ({} sites) to {}",
            document.categories.len(),
            document.site_count(),
            store.settings().data_path
        );
        return Ok(());
    }

    info!("Pushing navigation data from {}", input.display());
    let result = store.save_navigation_document(&document).await?;

    println!("✅ Navigation data committed");
    if let Some(sha) = result.commit_sha() {
        println!("  Commit: {}", sha);
    }
    if let Some(url) = result.commit_url() {
        println!("  {}", url);
    }
    Ok(())
}
