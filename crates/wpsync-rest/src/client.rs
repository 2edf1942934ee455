use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use wpsync_core::config::RestConfig;
use wpsync_core::error::{SyncError, SyncResult};
use wpsync_core::http::{build_client, HttpConfig};
use wpsync_core::model::{Blog, BlogMetadata, BlogOptions, Category, Media, PostFormats};
use wpsync_core::remote::{
    compose_blog_metadata, BlogServiceRemote, Capability, MetadataProgress, Transport,
};
use wpsync_core::retry::{retry, RetryConfig};

use crate::types::{
    ApiError, CategoriesResponse, MediaResponse, PostFormatsResponse, SiteResponse,
};

/// The API caps category pages at this many entries
const MAX_CATEGORIES: u32 = 1000;

/// Blog service remote speaking the WordPress.com REST API
#[derive(Clone)]
pub struct RestRemote {
    client: Client,
    base_url: String,
    media_page_size: u32,
    retry: RetryConfig,
}

impl RestRemote {
    /// Create a new REST remote
    pub fn new(http: &HttpConfig, config: &RestConfig) -> SyncResult<Self> {
        let client = build_client(http)?;
        Ok(Self::with_client(client, config, http.retry.clone()))
    }

    pub fn with_client(client: Client, config: &RestConfig, retry: RetryConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            media_page_size: config.media_page_size.max(1),
            retry,
        }
    }

    fn site_url(&self, site_id: u64, path: &str) -> SyncResult<Url> {
        let url = if path.is_empty() {
            format!("{}/sites/{}", self.base_url, site_id)
        } else {
            format!("{}/sites/{}/{}", self.base_url, site_id, path)
        };
        Url::parse(&url).map_err(|e| SyncError::config(format!("Invalid REST URL {}: {}", url, e)))
    }

    /// GET a site resource, retrying transient failures
    async fn get<T: DeserializeOwned>(
        &self,
        blog: &Blog,
        path: &str,
        query: &[(&str, String)],
    ) -> SyncResult<T> {
        let (site_id, token) = blog.rest_identity()?;
        let url = self.site_url(site_id, path)?;
        let label = format!("GET {}", url.path());
        retry(&self.retry, &label, || self.fetch(&url, token, query)).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &Url,
        token: &str,
        query: &[(&str, String)],
    ) -> SyncResult<T> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| SyncError::parse(format!("Invalid response from {}: {}", url.path(), e)))
    }
}

/// Map a failed response to an error, preferring the API's own message
fn error_for_status(status: StatusCode, body: &str) -> SyncError {
    let message = match serde_json::from_str::<ApiError>(body) {
        Ok(ApiError {
            message: Some(message),
            ..
        }) => message,
        Ok(ApiError {
            error: Some(error), ..
        }) => error,
        _ => status
            .canonical_reason()
            .unwrap_or("Unexpected response")
            .to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::auth(message),
        _ => SyncError::http(status, message),
    }
}

#[async_trait]
impl BlogServiceRemote for RestRemote {
    fn transport(&self) -> Transport {
        Transport::Rest
    }

    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    async fn sync_categories(&self, blog: &Blog) -> SyncResult<Vec<Category>> {
        let mut categories = Vec::new();
        let mut page = 1u32;

        loop {
            let query = [
                ("number", MAX_CATEGORIES.to_string()),
                ("page", page.to_string()),
            ];
            let response: CategoriesResponse = self.get(blog, "categories", &query).await?;
            if response.categories.is_empty() {
                break;
            }
            categories.extend(response.categories.into_iter().map(Category::from));
            if categories.len() as u64 >= response.found {
                break;
            }
            debug!("{} has {} categories; fetching page {}", blog.name, response.found, page + 1);
            page += 1;
        }

        info!("Synced {} categories for {}", categories.len(), blog.name);
        Ok(categories)
    }

    async fn sync_options(&self, blog: &Blog) -> SyncResult<BlogOptions> {
        let site: SiteResponse = self.get(blog, "", &[]).await?;
        let options = site.into_options();
        info!("Synced {} options for {}", options.len(), blog.name);
        Ok(options)
    }

    async fn sync_media_library(&self, blog: &Blog) -> SyncResult<Vec<Media>> {
        let mut media = Vec::new();
        let mut page = 1u32;

        loop {
            let query = [
                ("number", self.media_page_size.to_string()),
                ("page", page.to_string()),
            ];
            let response: MediaResponse = self.get(blog, "media", &query).await?;
            if response.media.is_empty() {
                break;
            }
            media.extend(response.media.into_iter().map(Media::from));
            if media.len() as u64 >= response.found {
                break;
            }
            page += 1;
        }

        info!("Synced {} media items for {}", media.len(), blog.name);
        Ok(media)
    }

    async fn sync_post_formats(&self, blog: &Blog) -> SyncResult<PostFormats> {
        let response: PostFormatsResponse = self.get(blog, "post-formats", &[]).await?;
        let formats = response.into_post_formats()?;
        info!("Synced {} post formats for {}", formats.len(), blog.name);
        Ok(formats)
    }

    async fn sync_blog_metadata(
        &self,
        blog: &Blog,
        progress: &MetadataProgress,
    ) -> SyncResult<BlogMetadata> {
        compose_blog_metadata(self, blog, progress).await
    }
}
