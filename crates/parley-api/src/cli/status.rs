//! System status command.

use anyhow::Result;
use console::style;

use parley_infra::config::resolve_database_url;

use crate::state::AppState;

/// Display data directory, database location and account count.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.user_directory.list_users(1).await?;
    let database = resolve_database_url(&state.config, &state.data_dir);

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "database": database,
            "users": users.total,
            "per_page": state.config.pagination.per_page,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Parley v{}",
        style("●").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("  {:<12} {}", style("Data dir").dim(), state.data_dir.display());
    println!("  {:<12} {}", style("Database").dim(), database);
    println!("  {:<12} {}", style("Users").dim(), users.total);
    println!(
        "  {:<12} {}",
        style("Page size").dim(),
        state.config.pagination.per_page
    );
    println!();
    Ok(())
}
