//! WordPress.com REST transport.
//!
//! Talks to the v1.1 REST API for blogs hosted on (or connected to) WordPress.com.
//! Every request is authenticated with the blog's OAuth bearer token.

mod client;
pub mod types;

pub use client::RestRemote;
