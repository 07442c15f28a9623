use catnav_store::{ConnectionStatus, ContentStore};
use eyre::Result;

/// Handle the verify command - check credentials and repository access
pub async fn handle_verify_command(store: &ContentStore, json: bool) -> Result<()> {
    let status = store.verify_connection().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        match &status {
            ConnectionStatus::Connected {
                repository,
                permissions,
            } => {
                println!("✅ Connected to {}", repository);
                let granted: Vec<&str> = permissions
                    .iter()
                    .filter(|(_, allowed)| **allowed)
                    .map(|(name, _)| name.as_str())
                    .collect();
                if granted.is_empty() {
                    println!("  Permissions: (none reported)");
                } else {
                    println!("  Permissions: {}", granted.join(", "));
                }
                if !permissions.get("push").copied().unwrap_or(false) {
                    println!("💡 The token cannot push; saves and uploads will be rejected");
                }
            }
            ConnectionStatus::Disconnected { message } => {
                println!("❌ Not connected: {}", message);
            }
        }
    }

    if status.is_connected() {
        Ok(())
    } else {
        Err(eyre::eyre!("GitHub connection check failed"))
    }
}
