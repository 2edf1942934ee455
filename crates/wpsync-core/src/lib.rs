//! Core types and traits for wpsync.
//!
//! This crate provides the domain model, the [`BlogServiceRemote`] trait that every
//! transport implements, and the shared error, configuration, HTTP, retry and
//! logging utilities used throughout the workspace.

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod model;
pub mod remote;
pub mod retry;
pub mod settings;

// Re-export commonly used types
pub use crate::config::{FeatureFlags, RestConfig, ServiceConfig, WpSyncConfig, XmlRpcConfig};
pub use crate::error::{SyncError, SyncResult};
pub use crate::http::HttpConfig;
pub use crate::model::{
    Blog, BlogMetadata, BlogOptions, Category, Media, OptionValue, PostFormats,
};
pub use crate::remote::{
    compose_blog_metadata, BlogServiceRemote, Capability, MetadataEvent, MetadataProgress,
    Transport,
};
pub use crate::retry::{retry, RetryConfig};

/// Version of wpsync
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
