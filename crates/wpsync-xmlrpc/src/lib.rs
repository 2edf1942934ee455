//! WordPress XML-RPC transport for wpsync.
//!
//! This crate provides [`XmlRpcRemote`], a [`wpsync_core::BlogServiceRemote`]
//! that talks to a blog's `xmlrpc.php`, together with the XML-RPC value codec it
//! is built on.

mod client;
pub mod codec;
pub mod mapping;

pub use client::{XmlRpcRemote, METHOD_NOT_FOUND};
pub use codec::{decode_response, encode_call, Value};
