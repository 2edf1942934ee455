use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::http::HttpConfig;
use crate::model::Blog;

pub const DEFAULT_REST_BASE_URL: &str = "https://public-api.wordpress.com/rest/v1.1";
const CONFIG_FILE_NAME: &str = "config.toml";
const SETTINGS_FILE_NAME: &str = "editor-settings.json";

/// Configuration for wpsync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WpSyncConfig {
    /// Where editor settings are stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<PathBuf>,
    /// HTTP settings shared by both transports
    #[serde(default)]
    pub http: HttpConfig,
    /// REST transport settings
    #[serde(default)]
    pub rest: RestConfig,
    /// XML-RPC transport settings
    #[serde(default)]
    pub xmlrpc: XmlRpcConfig,
    /// Orchestration settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Feature flags
    #[serde(default)]
    pub features: FeatureFlags,
    /// Blog accounts
    #[serde(default)]
    pub blogs: Vec<Blog>,
}

impl WpSyncConfig {
    /// Default location of the configuration file
    pub fn default_path() -> PathBuf {
        config_dir().join(CONFIG_FILE_NAME)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SyncResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SyncResult<()> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Convert config to TOML string
    pub fn to_toml(&self) -> SyncResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SyncError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Create config from TOML string
    pub fn from_toml(content: &str) -> SyncResult<Self> {
        toml::from_str(content).map_err(|e| SyncError::config(format!("Failed to parse config: {}", e)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> SyncResult<()> {
        if self.rest.media_page_size == 0 || self.xmlrpc.media_page_size == 0 {
            return Err(SyncError::config("Media page size must be greater than zero"));
        }

        if self.service.max_concurrent_blogs == 0 {
            return Err(SyncError::config("max_concurrent_blogs must be greater than zero"));
        }

        let mut names = HashSet::new();
        for blog in &self.blogs {
            if !names.insert(blog.name.as_str()) {
                return Err(SyncError::config(format!("Duplicate blog name: {}", blog.name)));
            }

            if !blog.uses_rest() && blog.xmlrpc_credentials().is_err() {
                return Err(SyncError::config(format!(
                    "Blog {} needs either dotcom_id and auth_token or username and password",
                    blog.name
                )));
            }
        }

        Ok(())
    }

    /// Find a blog by name
    pub fn blog(&self, name: &str) -> SyncResult<&Blog> {
        self.blogs
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| SyncError::config(format!("Unknown blog: {}", name)))
    }

    /// Editor settings file, falling back to the user config directory
    pub fn settings_path(&self) -> PathBuf {
        self.settings_path
            .clone()
            .unwrap_or_else(|| config_dir().join(SETTINGS_FILE_NAME))
    }
}

/// REST transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub base_url: String,
    /// Media items requested per page
    pub media_page_size: u32,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REST_BASE_URL.to_string(),
            media_page_size: 100,
        }
    }
}

/// XML-RPC transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlRpcConfig {
    /// Media items requested per page
    pub media_page_size: u32,
    /// Fetch blog metadata with a single `system.multicall`
    pub use_multicall: bool,
}

impl Default for XmlRpcConfig {
    fn default() -> Self {
        Self {
            media_page_size: 100,
            use_multicall: true,
        }
    }
}

/// Orchestration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Blogs synced at the same time by a full `sync`
    pub max_concurrent_blogs: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_blogs: 4,
        }
    }
}

/// Feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Allow the native block editor to be enabled
    pub native_editor: bool,
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("wpsync"))
        .unwrap_or_else(|| PathBuf::from(".wpsync"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[http]
request_timeout = 30

[http.retry]
max_attempts = 5

[xmlrpc]
use_multicall = false

[features]
native_editor = true

[[blogs]]
name = "personal"
url = "https://personal.example.org"
username = "admin"
password = "secret"

[[blogs]]
name = "hosted"
url = "https://hosted.wordpress.com"
dotcom_id = 12345
auth_token = "token"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = WpSyncConfig::from_toml(SAMPLE).unwrap();
        config.validate().unwrap();

        assert_eq!(config.http.request_timeout, 30);
        assert_eq!(config.http.connect_timeout, 10);
        assert_eq!(config.http.retry.max_attempts, 5);
        assert_eq!(config.http.retry.initial_delay_ms, 500);
        assert!(!config.xmlrpc.use_multicall);
        assert_eq!(config.rest.base_url, DEFAULT_REST_BASE_URL);
        assert!(config.features.native_editor);

        assert_eq!(config.blogs.len(), 2);
        assert!(!config.blog("personal").unwrap().uses_rest());
        assert!(config.blog("hosted").unwrap().uses_rest());
        assert!(config.blog("missing").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = WpSyncConfig::from_toml(SAMPLE).unwrap();
        config.blogs[1].name = "personal".to_string();
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));

        let mut config = WpSyncConfig::from_toml(SAMPLE).unwrap();
        config.blogs[0].password = None;
        assert!(config.validate().is_err());

        let mut config = WpSyncConfig::from_toml(SAMPLE).unwrap();
        config.rest.media_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = WpSyncConfig::from_toml(SAMPLE).unwrap();
        config.save(&path).unwrap();

        let loaded = WpSyncConfig::from_file(&path).unwrap();
        assert_eq!(loaded.blogs, config.blogs);
        assert_eq!(loaded.http, config.http);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempdir().unwrap();
        let err = WpSyncConfig::from_file(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
