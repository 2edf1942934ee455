//! Sync orchestration: picks a transport per blog and runs the sync operations.

mod factory;
mod service;

pub use factory::{RemoteFactory, TransportFactory};
pub use service::{BlogService, BlogSnapshot, SyncOutput};
