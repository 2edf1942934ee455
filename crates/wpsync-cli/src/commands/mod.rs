//! CLI command implementations

use std::sync::Arc;

use anyhow::Result;

use wpsync_core::config::WpSyncConfig;
use wpsync_service::{BlogService, TransportFactory};

pub mod editor;
pub mod fetch;
pub mod metadata;
pub mod sync;

pub use editor::execute as execute_editor;
pub use fetch::execute as execute_fetch;
pub use metadata::execute as execute_metadata;
pub use sync::execute as execute_sync;

/// Build the blog service for the configured transports
pub(crate) fn blog_service(config: &WpSyncConfig) -> Result<BlogService> {
    let factory = TransportFactory::from_config(config)?;
    Ok(BlogService::new(Arc::new(factory), config.service.clone()))
}
