use anyhow::Result;

use wpsync_core::config::WpSyncConfig;
use wpsync_core::remote::MetadataProgress;

use crate::commands::blog_service;
use crate::output::{format_event, print_json};

/// Execute the composite metadata sync, reporting parts on stderr as they arrive
pub async fn execute(config: &WpSyncConfig, blog: &str) -> Result<()> {
    let blog = config.blog(blog)?;
    let service = blog_service(config)?;
    let (progress, mut events) = MetadataProgress::channel();

    let sync = async move {
        let result = service.sync_metadata(blog, &progress).await;
        // Closes the channel so the reporter below finishes
        drop(progress);
        result
    };
    let report = async {
        while let Some(event) = events.recv().await {
            eprintln!("{}", format_event(&event));
        }
    };

    let (metadata, ()) = tokio::join!(sync, report);
    print_json(&metadata?)
}
