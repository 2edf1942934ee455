use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use wpsync_core::config::ServiceConfig;
use wpsync_core::error::{SyncError, SyncResult};
use wpsync_core::model::{Blog, BlogMetadata, BlogOptions, Category, Media, PostFormats};
use wpsync_core::remote::{BlogServiceRemote, Capability, MetadataProgress, Transport};

use crate::factory::RemoteFactory;

/// Everything fetched from one blog by a full sync
#[derive(Debug, Clone, Serialize)]
pub struct BlogSnapshot {
    pub blog: String,
    pub transport: Transport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<Media>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BlogOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_formats: Option<PostFormats>,
    /// Capabilities the transport does not offer
    pub skipped: Vec<Capability>,
}

impl BlogSnapshot {
    fn new(blog: &Blog, transport: Transport) -> Self {
        Self {
            blog: blog.name.clone(),
            transport,
            categories: None,
            media: None,
            options: None,
            post_formats: None,
            skipped: Vec::new(),
        }
    }
}

/// Result of a single operation
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SyncOutput {
    Categories(Vec<Category>),
    Options(BlogOptions),
    MediaLibrary(Vec<Media>),
    PostFormats(PostFormats),
    BlogMetadata(BlogMetadata),
}

/// Runs sync operations against blogs through the remote chosen for each
pub struct BlogService {
    factory: Arc<dyn RemoteFactory>,
    config: ServiceConfig,
}

impl BlogService {
    pub fn new(factory: Arc<dyn RemoteFactory>, config: ServiceConfig) -> Self {
        Self { factory, config }
    }

    /// Run one operation
    pub async fn run(&self, blog: &Blog, capability: Capability) -> SyncResult<SyncOutput> {
        let remote = self.factory.remote_for(blog);
        let output = match capability {
            Capability::Categories => SyncOutput::Categories(remote.sync_categories(blog).await?),
            Capability::Options => SyncOutput::Options(remote.sync_options(blog).await?),
            Capability::MediaLibrary => {
                SyncOutput::MediaLibrary(remote.sync_media_library(blog).await?)
            }
            Capability::PostFormats => {
                SyncOutput::PostFormats(remote.sync_post_formats(blog).await?)
            }
            Capability::BlogMetadata => SyncOutput::BlogMetadata(
                remote
                    .sync_blog_metadata(blog, &MetadataProgress::none())
                    .await?,
            ),
        };
        Ok(output)
    }

    /// Composite metadata sync reporting sub-results through `progress`
    pub async fn sync_metadata(
        &self,
        blog: &Blog,
        progress: &MetadataProgress,
    ) -> SyncResult<BlogMetadata> {
        self.factory
            .remote_for(blog)
            .sync_blog_metadata(blog, progress)
            .await
    }

    /// Sync everything the blog's transport offers.
    ///
    /// Unsupported capabilities are skipped; any other failure fails the sync.
    pub async fn sync_blog(&self, blog: &Blog) -> SyncResult<BlogSnapshot> {
        let remote = self.factory.remote_for(blog);
        let mut snapshot = BlogSnapshot::new(blog, remote.transport());
        info!("Syncing {} over {}", blog.name, remote.transport());

        let quiet = MetadataProgress::none();
        let metadata = attempt(&mut snapshot, &*remote, Capability::BlogMetadata, || {
            remote.sync_blog_metadata(blog, &quiet)
        })
        .await?;

        match metadata {
            Some(metadata) => {
                snapshot.media = Some(metadata.media);
                snapshot.options = Some(metadata.options);
                snapshot.post_formats = Some(metadata.post_formats);
            }
            None => {
                let media = attempt(&mut snapshot, &*remote, Capability::MediaLibrary, || {
                    remote.sync_media_library(blog)
                })
                .await?;
                let options = attempt(&mut snapshot, &*remote, Capability::Options, || {
                    remote.sync_options(blog)
                })
                .await?;
                let post_formats = attempt(&mut snapshot, &*remote, Capability::PostFormats, || {
                    remote.sync_post_formats(blog)
                })
                .await?;
                snapshot.media = media;
                snapshot.options = options;
                snapshot.post_formats = post_formats;
            }
        }

        let categories = attempt(&mut snapshot, &*remote, Capability::Categories, || {
            remote.sync_categories(blog)
        })
        .await?;
        snapshot.categories = categories;

        info!(
            "Finished {} ({} skipped)",
            blog.name,
            snapshot.skipped.len()
        );
        Ok(snapshot)
    }

    /// Sync several blogs concurrently; results keep the order of `blogs`
    pub async fn sync_all(&self, blogs: &[Blog]) -> Vec<(String, SyncResult<BlogSnapshot>)> {
        let limit = self.config.max_concurrent_blogs.max(1);
        stream::iter(blogs)
            .map(|blog| async move { (blog.name.clone(), self.sync_blog(blog).await) })
            .buffered(limit)
            .collect()
            .await
    }
}

/// Run an operation unless the remote lacks it, recording skipped capabilities
async fn attempt<T, F, Fut>(
    snapshot: &mut BlogSnapshot,
    remote: &dyn BlogServiceRemote,
    capability: Capability,
    operation: F,
) -> SyncResult<Option<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    let result = if remote.supports(capability) {
        operation().await
    } else {
        Err(SyncError::unsupported(capability, remote.transport()))
    };

    match result {
        Ok(value) => Ok(Some(value)),
        Err(SyncError::Unsupported { .. }) => {
            warn!(
                "Skipping {} for {}: not supported by {}",
                capability,
                snapshot.blog,
                remote.transport()
            );
            snapshot.skipped.push(capability);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
