use anyhow::Result;
use tracing::debug;

use wpsync_core::config::WpSyncConfig;
use wpsync_core::remote::Capability;

use crate::commands::blog_service;
use crate::output::print_json;

/// Execute a single sync operation and print its result
pub async fn execute(config: &WpSyncConfig, blog: &str, capability: Capability) -> Result<()> {
    let blog = config.blog(blog)?;
    debug!("Fetching {} for {}", capability, blog.name);

    let output = blog_service(config)?.run(blog, capability).await?;
    print_json(&output)
}
