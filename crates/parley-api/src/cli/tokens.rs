//! Revoked-token maintenance.

use std::time::Duration;

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// One-shot sweep of expired revocations.
pub async fn purge_tokens(state: &AppState, json: bool) -> Result<()> {
    let purged = state.auth_service.purge_expired_revocations().await?;

    if json {
        println!("{}", serde_json::json!({ "purged": purged }));
        return Ok(());
    }

    println!(
        "  {} Purged {} expired token revocation{}",
        style("✓").green().bold(),
        style(purged).bold(),
        if purged == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Sweep expired revocations every `every` until the task is aborted.
pub fn spawn_revocation_sweep(state: AppState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match state.auth_service.purge_expired_revocations().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "expired token revocations removed"),
                Err(e) => tracing::warn!("revocation sweep failed: {e}"),
            }
        }
    })
}
