//! Response bodies of the REST API and their conversion into domain types.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use wpsync_core::error::{SyncError, SyncResult};
use wpsync_core::model::{BlogOptions, Category, Media, OptionValue, PostFormats};

/// Site-level options copied verbatim from the `options` object
const COPIED_OPTIONS: &[&str] = &[
    "admin_url",
    "login_url",
    "unmapped_url",
    "image_default_link_type",
    "software_version",
    "videopress_enabled",
    "gmt_offset",
    "allowed_file_types",
    "jetpack_version",
    "permalink_structure",
    "max_upload_size",
];

/// Error body returned with non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub categories: Vec<RestCategory>,
}

#[derive(Debug, Deserialize)]
pub struct RestCategory {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub parent: u64,
    #[serde(default)]
    pub post_count: Option<u64>,
}

impl From<RestCategory> for Category {
    fn from(category: RestCategory) -> Self {
        Category {
            id: category.id,
            name: category.name,
            slug: category.slug,
            parent_id: category.parent,
            post_count: category.post_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SiteResponse {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(default)]
    pub jetpack: bool,
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl SiteResponse {
    /// Normalize the site object into the option names XML-RPC blogs report.
    ///
    /// Only the title and tagline are writable through the API.
    pub fn into_options(self) -> BlogOptions {
        let mut options = BlogOptions::new();
        options.insert("blog_title", OptionValue::writable(self.name));
        options.insert("blog_tagline", OptionValue::writable(self.description));
        options.insert("home_url", OptionValue::readonly(self.url));

        if self.jetpack {
            options.insert("jetpack_client_id", OptionValue::readonly(self.id));
        }
        if let Some(enabled) = self.options.get("featured_images_enabled") {
            options.insert("post_thumbnail", OptionValue::readonly(enabled.clone()));
        }
        if let Some(timezone) = self.options.get("timezone") {
            options.insert("time_zone", OptionValue::readonly(timezone.clone()));
        }

        for name in COPIED_OPTIONS {
            if let Some(value) = self.options.get(*name) {
                options.insert(*name, OptionValue::readonly(value.clone()));
            }
        }

        options
    }
}

#[derive(Debug, Deserialize)]
pub struct MediaResponse {
    #[serde(default)]
    pub found: u64,
    #[serde(default)]
    pub media: Vec<RestMedia>,
}

#[derive(Debug, Deserialize)]
pub struct RestMedia {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "post_ID", default)]
    pub post_id: u64,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub description: String,
    // Numbers for images, empty strings for everything else
    #[serde(default)]
    pub width: Value,
    #[serde(default)]
    pub height: Value,
}

fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl From<RestMedia> for Media {
    fn from(media: RestMedia) -> Self {
        Media {
            id: media.id,
            url: media.url,
            title: media.title,
            caption: media.caption,
            description: media.description,
            date: media
                .date
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .map(|d| d.with_timezone(&Utc)),
            mime_type: media.mime_type.filter(|m| !m.is_empty()),
            file: media.file.filter(|f| !f.is_empty()),
            width: lenient_u64(&media.width),
            height: lenient_u64(&media.height),
            post_id: Some(media.post_id).filter(|id| *id != 0),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostFormatsResponse {
    #[serde(default)]
    pub formats: Value,
}

impl PostFormatsResponse {
    pub fn into_post_formats(self) -> SyncResult<PostFormats> {
        match self.formats {
            Value::Object(formats) => Ok(PostFormats::from_formats(
                formats
                    .into_iter()
                    .filter_map(|(slug, name)| name.as_str().map(|n| (slug, n.to_string()))),
            )),
            // Sites without theme support send an empty list
            Value::Array(items) if items.is_empty() => Ok(PostFormats::new()),
            Value::Null => Ok(PostFormats::new()),
            other => Err(SyncError::parse(format!("Unexpected post formats: {}", other))),
        }
    }
}
