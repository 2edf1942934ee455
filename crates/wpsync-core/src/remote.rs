//! The blog service remote: the set of sync operations a transport can offer.
//!
//! Transports implement [`BlogServiceRemote`] and advertise which operations they
//! support through [`BlogServiceRemote::supports`]. Operations a transport does not
//! override fail with [`SyncError::Unsupported`] instead of doing nothing, so callers
//! can either check support up front or react to the error.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::model::{Blog, BlogMetadata, BlogOptions, Category, Media, PostFormats};

/// One sync operation of the blog service remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Categories,
    Options,
    MediaLibrary,
    PostFormats,
    BlogMetadata,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Categories,
        Capability::Options,
        Capability::MediaLibrary,
        Capability::PostFormats,
        Capability::BlogMetadata,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Categories => "categories",
            Capability::Options => "options",
            Capability::MediaLibrary => "media library",
            Capability::PostFormats => "post formats",
            Capability::BlogMetadata => "blog metadata",
        };
        f.write_str(name)
    }
}

/// Wire protocol used by a remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Rest,
    XmlRpc,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Rest => f.write_str("REST"),
            Transport::XmlRpc => f.write_str("XML-RPC"),
        }
    }
}

/// Individual results of a blog metadata sync, in the order they complete
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataEvent {
    Media(Vec<Media>),
    Options(BlogOptions),
    PostFormats(PostFormats),
    /// All three parts succeeded
    Completed,
}

/// Receives the sub-results of a blog metadata sync as they arrive.
///
/// The default value discards events.
#[derive(Debug, Clone, Default)]
pub struct MetadataProgress {
    sender: Option<mpsc::UnboundedSender<MetadataEvent>>,
}

impl MetadataProgress {
    pub fn none() -> Self {
        Self::default()
    }

    /// Create a progress sink and the receiver that observes it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MetadataEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender: Some(sender) }, receiver)
    }

    pub fn emit(&self, event: MetadataEvent) {
        if let Some(sender) = &self.sender {
            // A dropped receiver means nobody is listening any more.
            let _ = sender.send(event);
        }
    }

    pub fn media(&self, media: &[Media]) {
        if self.sender.is_some() {
            self.emit(MetadataEvent::Media(media.to_vec()));
        }
    }

    pub fn options(&self, options: &BlogOptions) {
        if self.sender.is_some() {
            self.emit(MetadataEvent::Options(options.clone()));
        }
    }

    pub fn post_formats(&self, formats: &PostFormats) {
        if self.sender.is_some() {
            self.emit(MetadataEvent::PostFormats(formats.clone()));
        }
    }

    pub fn completed(&self) {
        self.emit(MetadataEvent::Completed);
    }
}

/// Interface for blog sync transports (e.g., REST, XML-RPC)
#[async_trait]
pub trait BlogServiceRemote: Send + Sync {
    /// Transport this remote speaks
    fn transport(&self) -> Transport;

    /// Whether the given operation is implemented by this remote
    fn supports(&self, capability: Capability) -> bool;

    /// Fetch the blog's categories
    async fn sync_categories(&self, _blog: &Blog) -> SyncResult<Vec<Category>> {
        Err(SyncError::unsupported(Capability::Categories, self.transport()))
    }

    /// Fetch the blog's options
    async fn sync_options(&self, _blog: &Blog) -> SyncResult<BlogOptions> {
        Err(SyncError::unsupported(Capability::Options, self.transport()))
    }

    /// Fetch the blog's media library
    async fn sync_media_library(&self, _blog: &Blog) -> SyncResult<Vec<Media>> {
        Err(SyncError::unsupported(Capability::MediaLibrary, self.transport()))
    }

    /// Fetch the post formats supported by the blog's theme
    async fn sync_post_formats(&self, _blog: &Blog) -> SyncResult<PostFormats> {
        Err(SyncError::unsupported(Capability::PostFormats, self.transport()))
    }

    /// Fetch media, options and post formats together.
    ///
    /// Each part is reported to `progress` when it succeeds, followed by
    /// [`MetadataEvent::Completed`]. The first failure ends the sync.
    async fn sync_blog_metadata(
        &self,
        _blog: &Blog,
        _progress: &MetadataProgress,
    ) -> SyncResult<BlogMetadata> {
        Err(SyncError::unsupported(Capability::BlogMetadata, self.transport()))
    }
}

/// Run the three metadata syncs concurrently through the individual operations.
///
/// Parts are reported as they finish. When one part fails the others are
/// dropped and that failure is returned.
pub async fn compose_blog_metadata<R>(
    remote: &R,
    blog: &Blog,
    progress: &MetadataProgress,
) -> SyncResult<BlogMetadata>
where
    R: BlogServiceRemote + ?Sized,
{
    let parts = [
        Capability::MediaLibrary,
        Capability::Options,
        Capability::PostFormats,
    ];
    if parts.iter().any(|c| !remote.supports(*c)) {
        return Err(SyncError::unsupported(
            Capability::BlogMetadata,
            remote.transport(),
        ));
    }

    debug!("Composing blog metadata for {} over {}", blog.name, remote.transport());

    let media = async {
        let media = remote.sync_media_library(blog).await?;
        progress.media(&media);
        Ok::<_, SyncError>(media)
    };
    let options = async {
        let options = remote.sync_options(blog).await?;
        progress.options(&options);
        Ok::<_, SyncError>(options)
    };
    let post_formats = async {
        let formats = remote.sync_post_formats(blog).await?;
        progress.post_formats(&formats);
        Ok::<_, SyncError>(formats)
    };

    let (media, options, post_formats) = futures::try_join!(media, options, post_formats)?;
    progress.completed();

    Ok(BlogMetadata {
        media,
        options,
        post_formats,
    })
}
