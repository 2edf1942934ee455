use anyhow::{anyhow, bail, Result};
use tracing::info;

use wpsync_core::config::WpSyncConfig;
use wpsync_core::model::Blog;

use crate::commands::blog_service;
use crate::output::{format_error, format_snapshot, format_warning, print_json};

/// Execute a full sync of one blog or every configured blog
pub async fn execute(config: &WpSyncConfig, blog: Option<&str>) -> Result<()> {
    let blogs: Vec<Blog> = match blog {
        Some(name) => vec![config.blog(name)?.clone()],
        None => config.blogs.clone(),
    };
    if blogs.is_empty() {
        bail!("No blogs configured");
    }

    info!("Syncing {} blog(s)", blogs.len());
    let results = blog_service(config)?.sync_all(&blogs).await;

    let mut snapshots = Vec::new();
    let mut failures = 0;
    for (name, result) in results {
        match result {
            Ok(snapshot) => {
                eprintln!("{}", format_snapshot(&snapshot));
                if !snapshot.skipped.is_empty() {
                    eprintln!(
                        "{}",
                        format_warning(&format!(
                            "{} does not support every operation over {}",
                            name, snapshot.transport
                        ))
                    );
                }
                snapshots.push(snapshot);
            }
            Err(e) => {
                eprintln!("{}", format_error(&format!("{}: {}", name, e)));
                failures += 1;
            }
        }
    }

    print_json(&snapshots)?;

    if failures > 0 {
        return Err(anyhow!("{} of {} blogs failed to sync", failures, blogs.len()));
    }
    Ok(())
}
