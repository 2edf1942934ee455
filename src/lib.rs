//! wpsync: keeps a local picture of WordPress blogs in sync.
//!
//! Fetches categories, options, the media library and post formats over the
//! WordPress.com REST API or a self-hosted blog's XML-RPC endpoint.

pub use wpsync_core as core;
pub use wpsync_rest as rest;
pub use wpsync_service as service;
pub use wpsync_xmlrpc as xmlrpc;

/// Version of wpsync
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
