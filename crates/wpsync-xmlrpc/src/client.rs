use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use wpsync_core::config::XmlRpcConfig;
use wpsync_core::error::{SyncError, SyncResult};
use wpsync_core::http::{build_client, HttpConfig};
use wpsync_core::model::{Blog, BlogMetadata, BlogOptions, Category, Media, PostFormats};
use wpsync_core::remote::{
    compose_blog_metadata, BlogServiceRemote, Capability, MetadataProgress, Transport,
};
use wpsync_core::retry::{retry, RetryConfig};

use crate::codec::{decode_response, encode_call, fault_from_value, Value};
use crate::mapping::{
    categories_from_terms, media_from_library, options_from_value, post_formats_from_value,
};

/// WordPress ignores the blog ID on single-site installs
const BLOG_ID: i64 = 1;
/// Fault code for an unknown method
pub const METHOD_NOT_FOUND: i64 = -32601;
const MAX_ERROR_BODY: usize = 200;

/// Blog service remote speaking WordPress XML-RPC
#[derive(Clone)]
pub struct XmlRpcRemote {
    client: Client,
    config: XmlRpcConfig,
    retry: RetryConfig,
}

impl XmlRpcRemote {
    /// Create a new XML-RPC remote
    pub fn new(http: &HttpConfig, config: XmlRpcConfig) -> SyncResult<Self> {
        let client = build_client(http)?;
        Ok(Self::with_client(client, config, http.retry.clone()))
    }

    pub fn with_client(client: Client, mut config: XmlRpcConfig, retry: RetryConfig) -> Self {
        config.media_page_size = config.media_page_size.max(1);
        Self {
            client,
            config,
            retry,
        }
    }

    /// Call a method, retrying transient failures
    pub async fn call(&self, endpoint: &Url, method: &str, params: &[Value]) -> SyncResult<Value> {
        let body = encode_call(method, params);
        retry(&self.retry, method, || self.post(endpoint, method, body.clone())).await
    }

    async fn post(&self, endpoint: &Url, method: &str, body: String) -> SyncResult<Value> {
        debug!("Calling {} at {}", method, endpoint);

        let response = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = truncate(&text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SyncError::auth(format!("{} rejected by server: {}", method, message))
                }
                _ => SyncError::http(status, message),
            });
        }

        decode_response(&text)
    }

    /// Run several calls in one `system.multicall` round trip.
    ///
    /// Each entry of the result is the outcome of the call at the same position.
    pub async fn multicall(
        &self,
        endpoint: &Url,
        calls: Vec<(&str, Vec<Value>)>,
    ) -> SyncResult<Vec<SyncResult<Value>>> {
        let expected = calls.len();
        let requests = calls
            .into_iter()
            .map(|(method, params)| {
                Value::structure([
                    ("methodName", Value::from(method)),
                    ("params", Value::Array(params)),
                ])
            })
            .collect::<Vec<_>>();

        let response = self
            .call(endpoint, "system.multicall", &[Value::Array(requests)])
            .await?;

        let entries = response
            .as_array()
            .ok_or_else(|| SyncError::parse("system.multicall did not return an array"))?;
        if entries.len() != expected {
            return Err(SyncError::parse(format!(
                "system.multicall returned {} results for {} calls",
                entries.len(),
                expected
            )));
        }

        Ok(entries
            .iter()
            .map(|entry| match entry {
                Value::Array(values) => values
                    .first()
                    .cloned()
                    .ok_or_else(|| SyncError::parse("Empty multicall result")),
                Value::Struct(_) => Err(fault_from_value(entry)),
                _ => Err(SyncError::parse("Unexpected multicall result")),
            })
            .collect())
    }

    fn auth_params(blog: &Blog) -> SyncResult<Vec<Value>> {
        let (username, password) = blog.xmlrpc_credentials()?;
        Ok(vec![Value::Int(BLOG_ID), username.into(), password.into()])
    }

    fn with_auth(blog: &Blog, extra: impl IntoIterator<Item = Value>) -> SyncResult<Vec<Value>> {
        let mut params = Self::auth_params(blog)?;
        params.extend(extra);
        Ok(params)
    }

    fn media_filter(&self, offset: usize) -> Value {
        Value::structure([
            ("number", Value::from(self.config.media_page_size)),
            ("offset", Value::Int(offset as i64)),
        ])
    }

    fn post_formats_filter() -> Value {
        Value::structure([("show-supported", Value::from("1"))])
    }

    /// Fetch media pages starting after the items already collected
    async fn fetch_media_from(
        &self,
        endpoint: &Url,
        blog: &Blog,
        mut media: Vec<Media>,
    ) -> SyncResult<Vec<Media>> {
        let page_size = self.config.media_page_size as usize;

        loop {
            let params = Self::with_auth(blog, [self.media_filter(media.len())])?;
            let page = media_from_library(&self.call(endpoint, "wp.getMediaLibrary", &params).await?)?;
            let count = page.len();

            // Servers that ignore `offset` keep returning the first page
            if let Some(first) = page.first() {
                if media.iter().any(|m| m.id == first.id) {
                    warn!("{} repeated media item {}; stopping pagination", blog.name, first.id);
                    return Ok(media);
                }
            }
            media.extend(page);

            if count < page_size {
                return Ok(media);
            }
        }
    }

    async fn metadata_via_multicall(
        &self,
        blog: &Blog,
        progress: &MetadataProgress,
    ) -> SyncResult<BlogMetadata> {
        let endpoint = blog.xmlrpc_endpoint()?;
        let calls = vec![
            ("wp.getMediaLibrary", Self::with_auth(blog, [self.media_filter(0)])?),
            ("wp.getOptions", Self::auth_params(blog)?),
            ("wp.getPostFormats", Self::with_auth(blog, [Self::post_formats_filter()])?),
        ];

        let results = match self.multicall(&endpoint, calls).await {
            Err(SyncError::Fault { code, .. }) if code == METHOD_NOT_FOUND => {
                debug!("{} has no system.multicall; syncing metadata call by call", blog.name);
                return compose_blog_metadata(self, blog, progress).await;
            }
            other => other?,
        };

        let mut results = results.into_iter();
        let mut next = || {
            results
                .next()
                .unwrap_or_else(|| Err(SyncError::parse("Missing multicall result")))
        };
        let (media, options, post_formats) = (next(), next(), next());

        let mut media = media_from_library(&media?)?;
        if media.len() >= self.config.media_page_size as usize {
            media = self.fetch_media_from(&endpoint, blog, media).await?;
        }
        progress.media(&media);

        let options = options_from_value(&options?)?;
        progress.options(&options);

        let post_formats = post_formats_from_value(&post_formats?)?;
        progress.post_formats(&post_formats);

        progress.completed();
        Ok(BlogMetadata {
            media,
            options,
            post_formats,
        })
    }
}

#[async_trait]
impl BlogServiceRemote for XmlRpcRemote {
    fn transport(&self) -> Transport {
        Transport::XmlRpc
    }

    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    async fn sync_categories(&self, blog: &Blog) -> SyncResult<Vec<Category>> {
        let endpoint = blog.xmlrpc_endpoint()?;
        let params = Self::with_auth(blog, [Value::from("category")])?;
        let categories = categories_from_terms(&self.call(&endpoint, "wp.getTerms", &params).await?)?;
        info!("Synced {} categories for {}", categories.len(), blog.name);
        Ok(categories)
    }

    async fn sync_options(&self, blog: &Blog) -> SyncResult<BlogOptions> {
        let endpoint = blog.xmlrpc_endpoint()?;
        let params = Self::auth_params(blog)?;
        let options = options_from_value(&self.call(&endpoint, "wp.getOptions", &params).await?)?;
        info!("Synced {} options for {}", options.len(), blog.name);
        Ok(options)
    }

    async fn sync_media_library(&self, blog: &Blog) -> SyncResult<Vec<Media>> {
        let endpoint = blog.xmlrpc_endpoint()?;
        let media = self.fetch_media_from(&endpoint, blog, Vec::new()).await?;
        info!("Synced {} media items for {}", media.len(), blog.name);
        Ok(media)
    }

    async fn sync_post_formats(&self, blog: &Blog) -> SyncResult<PostFormats> {
        let endpoint = blog.xmlrpc_endpoint()?;
        let params = Self::with_auth(blog, [Self::post_formats_filter()])?;
        let formats =
            post_formats_from_value(&self.call(&endpoint, "wp.getPostFormats", &params).await?)?;
        info!("Synced {} post formats for {}", formats.len(), blog.name);
        Ok(formats)
    }

    async fn sync_blog_metadata(
        &self,
        blog: &Blog,
        progress: &MetadataProgress,
    ) -> SyncResult<BlogMetadata> {
        let metadata = if self.config.use_multicall {
            self.metadata_via_multicall(blog, progress).await?
        } else {
            compose_blog_metadata(self, blog, progress).await?
        };
        info!(
            "Synced blog metadata for {}: {} media, {} options, {} post formats",
            blog.name,
            metadata.media.len(),
            metadata.options.len(),
            metadata.post_formats.len()
        );
        Ok(metadata)
    }
}

fn truncate(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_long_bodies() {
        assert_eq!(truncate("  short  "), "short");
        let long = "x".repeat(500);
        let truncated = truncate(&long);
        assert_eq!(truncated.len(), MAX_ERROR_BODY + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_auth_params_require_credentials() {
        let mut blog = Blog::new("test", Url::parse("https://example.org").unwrap());
        assert!(matches!(XmlRpcRemote::auth_params(&blog), Err(SyncError::Config(_))));

        blog.username = "admin".to_string();
        blog.password = Some("secret".to_string());
        assert_eq!(
            XmlRpcRemote::auth_params(&blog).unwrap(),
            vec![Value::Int(1), Value::from("admin"), Value::from("secret")]
        );
    }
}
