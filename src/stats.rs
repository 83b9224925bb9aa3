//! Index statistics.
//!
//! Summarises what the last ingestion produced: where the index lives,
//! which embedding model built it, and how many chunks each document
//! category contributed. Used by `codex stats`.

use anyhow::Result;

use crate::config::Config;
use crate::index::VectorIndex;

/// Run the stats command: open the index and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let index = VectorIndex::open(&config.index.dir).await?;
    let info = index.info().await?;
    let counts = index.counts_by_type().await?;

    println!("Persona Codex: Index Stats");
    println!("===========================");
    println!();
    println!("  Index:       {}", info.path.display());
    println!("  Size:        {}", format_bytes(info.size_bytes));
    println!("  Model:       {} ({} dims)", info.model, info.dims);
    println!("  Built:       {}", format_built_at(&info.built_at));
    println!();
    println!("  Chunks:      {}", info.chunk_count);
    println!();
    println!("  By type:");
    println!("  {:<10} {:>8}", "TYPE", "CHUNKS");
    println!("  {}", "-".repeat(19));
    for (doc_type, count) in &counts {
        println!("  {:<10} {:>8}", doc_type.as_str(), count);
    }
    println!();

    index.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// RFC 3339 build time as `YYYY-MM-DD HH:MM (N days ago)`.
fn format_built_at(built_at: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(built_at) {
        Ok(dt) => {
            let ts = dt.timestamp();
            format!(
                "{} ({})",
                dt.format("%Y-%m-%d %H:%M"),
                format_age(chrono::Utc::now().timestamp() - ts)
            )
        }
        Err(_) => "unknown".to_string(),
    }
}

fn format_age(delta: i64) -> String {
    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    }
}
