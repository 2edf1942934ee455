//! Domain types shared by every transport.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{SyncError, SyncResult};

/// A blog account to synchronize
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blog {
    /// Name used to refer to the blog from the command line
    pub name: String,
    /// Public site URL
    pub url: Url,
    /// XML-RPC endpoint; defaults to `<url>/xmlrpc.php`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmlrpc_url: Option<Url>,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// WordPress.com site ID, present for hosted and Jetpack-connected sites
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dotcom_id: Option<u64>,
    /// OAuth2 bearer token for the REST API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Blog {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            xmlrpc_url: None,
            username: String::new(),
            password: None,
            dotcom_id: None,
            auth_token: None,
        }
    }

    /// Whether the blog is reachable through the REST API
    pub fn uses_rest(&self) -> bool {
        self.dotcom_id.is_some() && self.auth_token.is_some()
    }

    /// Resolve the XML-RPC endpoint for this blog
    pub fn xmlrpc_endpoint(&self) -> SyncResult<Url> {
        if let Some(url) = &self.xmlrpc_url {
            return Ok(url.clone());
        }

        let mut base = self.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("xmlrpc.php")
            .map_err(|e| SyncError::config(format!("Invalid XML-RPC URL for {}: {}", self.name, e)))
    }

    /// Credentials for XML-RPC calls
    pub fn xmlrpc_credentials(&self) -> SyncResult<(&str, &str)> {
        match self.password.as_deref() {
            Some(password) if !self.username.is_empty() => Ok((self.username.as_str(), password)),
            _ => Err(SyncError::config(format!(
                "Blog {} has no XML-RPC username/password",
                self.name
            ))),
        }
    }

    /// Site ID and token for REST calls
    pub fn rest_identity(&self) -> SyncResult<(u64, &str)> {
        match (self.dotcom_id, self.auth_token.as_deref()) {
            (Some(id), Some(token)) => Ok((id, token)),
            _ => Err(SyncError::config(format!(
                "Blog {} has no WordPress.com site ID and auth token",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for Blog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blog")
            .field("name", &self.name)
            .field("url", &self.url.as_str())
            .field("xmlrpc_url", &self.xmlrpc_url.as_ref().map(Url::as_str))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("dotcom_id", &self.dotcom_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A post category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Parent category ID, 0 for top level categories
    #[serde(default)]
    pub parent_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_count: Option<u64>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id == 0
    }
}

/// A single blog option
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionValue {
    pub value: serde_json::Value,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OptionValue {
    pub fn readonly(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            readonly: true,
            description: None,
        }
    }

    pub fn writable(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            readonly: false,
            description: None,
        }
    }
}

/// Blog options keyed by their XML-RPC option names
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct BlogOptions(BTreeMap<String, OptionValue>);

impl BlogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    /// Option value as a string, if it is one
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, OptionValue)> for BlogOptions {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An item from the blog's media library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Media {
    pub id: u64,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    /// Post the item is attached to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,
}

pub const STANDARD_POST_FORMAT: &str = "standard";

/// Post formats keyed by slug, valued by display name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PostFormats(BTreeMap<String, String>);

impl Default for PostFormats {
    fn default() -> Self {
        let mut formats = BTreeMap::new();
        formats.insert(STANDARD_POST_FORMAT.to_string(), "Standard".to_string());
        Self(formats)
    }
}

impl PostFormats {
    /// Only the standard format
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from server formats; the standard format is always present
    pub fn from_formats<I, K, V>(formats: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut result = Self::default();
        for (slug, name) in formats {
            result.0.insert(slug.into(), name.into());
        }
        result
    }

    pub fn get(&self, slug: &str) -> Option<&str> {
        self.0.get(slug).map(String::as_str)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.0.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Result of the composite metadata sync
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogMetadata {
    pub media: Vec<Media>,
    pub options: BlogOptions,
    pub post_formats: PostFormats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> Blog {
        Blog::new("example", Url::parse("https://example.org/blog").unwrap())
    }

    #[test]
    fn test_xmlrpc_endpoint_defaults_to_site_url() {
        let blog = blog();
        assert_eq!(
            blog.xmlrpc_endpoint().unwrap().as_str(),
            "https://example.org/blog/xmlrpc.php"
        );

        let mut explicit = blog;
        explicit.xmlrpc_url = Some(Url::parse("https://rpc.example.org/xmlrpc.php").unwrap());
        assert_eq!(
            explicit.xmlrpc_endpoint().unwrap().as_str(),
            "https://rpc.example.org/xmlrpc.php"
        );
    }

    #[test]
    fn test_transport_identity() {
        let mut blog = blog();
        assert!(!blog.uses_rest());
        assert!(blog.rest_identity().is_err());
        assert!(blog.xmlrpc_credentials().is_err());

        blog.username = "admin".to_string();
        blog.password = Some("secret".to_string());
        assert_eq!(blog.xmlrpc_credentials().unwrap(), ("admin", "secret"));

        blog.dotcom_id = Some(42);
        assert!(!blog.uses_rest());
        blog.auth_token = Some("token".to_string());
        assert!(blog.uses_rest());
        assert_eq!(blog.rest_identity().unwrap(), (42, "token"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut blog = blog();
        blog.password = Some("hunter2".to_string());
        blog.auth_token = Some("abcdef".to_string());
        let debug = format!("{:?}", blog);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("abcdef"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_post_formats_always_include_standard() {
        let formats = PostFormats::from_formats([("aside", "Aside"), ("gallery", "Gallery")]);
        assert_eq!(formats.len(), 3);
        assert_eq!(formats.get(STANDARD_POST_FORMAT), Some("Standard"));
        assert_eq!(formats.slugs().collect::<Vec<_>>(), vec!["aside", "gallery", "standard"]);

        let json = serde_json::to_value(&formats).unwrap();
        assert_eq!(json["aside"], "Aside");
    }
}
