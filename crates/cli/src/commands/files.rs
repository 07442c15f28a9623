use std::io::Write;
use std::path::Path;

use catnav_store::{ContentStore, FileContent};
use eyre::{Result, WrapErr};
use tokio::fs;

pub async fn handle_cat_command(store: &ContentStore, path: &str, binary: bool) -> Result<()> {
    let file = store.fetch_file(path, binary).await?;
    eprintln!("📄 {} @ {}", file.resolved_path, file.sha);

    let mut stdout = std::io::stdout().lock();
    match &file.content {
        FileContent::Text(text) => stdout.write_all(text.as_bytes())?,
        FileContent::Base64(encoded) => {
            let compact: String = encoded.split_whitespace().collect();
            writeln!(stdout, "{}", compact)?;
        }
    }
    stdout.flush()?;
    Ok(())
}

pub async fn handle_upload_command(
    store: &ContentStore,
    local: &Path,
    remote: &str,
    message: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let bytes = fs::read(local)
        .await
        .wrap_err_with(|| format!("Failed to read {}", local.display()))?;
    let message = message.unwrap_or_else(|| format!("chore: upload {}", remote));

    if dry_run {
        println!("Would upload {} ({} bytes) to {}", local.display(), bytes.len(), remote);
        return Ok(());
    }

    let result = store.upload_binary(remote, &bytes, &message).await?;

    println!("✅ Uploaded {} ({} bytes)", remote, bytes.len());
    if let Some(sha) = result.content_sha() {
        println!("  Content sha: {}", sha);
    }
    if let Some(url) = result.commit_url() {
        println!("  {}", url);
    }
    Ok(())
}
