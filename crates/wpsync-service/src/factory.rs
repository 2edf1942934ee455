use std::sync::Arc;

use tracing::debug;

use wpsync_core::config::WpSyncConfig;
use wpsync_core::error::SyncResult;
use wpsync_core::model::Blog;
use wpsync_core::remote::BlogServiceRemote;
use wpsync_rest::RestRemote;
use wpsync_xmlrpc::XmlRpcRemote;

/// Chooses the remote that serves a blog
pub trait RemoteFactory: Send + Sync {
    fn remote_for(&self, blog: &Blog) -> Arc<dyn BlogServiceRemote>;
}

/// Picks REST for blogs with a WordPress.com identity and XML-RPC for the rest
#[derive(Clone)]
pub struct TransportFactory {
    rest: Arc<dyn BlogServiceRemote>,
    xmlrpc: Arc<dyn BlogServiceRemote>,
}

impl TransportFactory {
    pub fn new(rest: Arc<dyn BlogServiceRemote>, xmlrpc: Arc<dyn BlogServiceRemote>) -> Self {
        Self { rest, xmlrpc }
    }

    /// Build both transports from the configuration
    pub fn from_config(config: &WpSyncConfig) -> SyncResult<Self> {
        let rest = RestRemote::new(&config.http, &config.rest)?;
        let xmlrpc = XmlRpcRemote::new(&config.http, config.xmlrpc.clone())?;
        Ok(Self::new(Arc::new(rest), Arc::new(xmlrpc)))
    }
}

impl RemoteFactory for TransportFactory {
    fn remote_for(&self, blog: &Blog) -> Arc<dyn BlogServiceRemote> {
        let remote = if blog.uses_rest() {
            &self.rest
        } else {
            &self.xmlrpc
        };
        debug!("Using {} for {}", remote.transport(), blog.name);
        Arc::clone(remote)
    }
}
