//! Bundled phoneme sound files
//!
//! Files are named `{KEY}{ext}` under an asset root that is either a local
//! directory or an http(s) base URL. Locators carry a `?v=` cache-busting
//! version so clients refetch after the asset set changes.

use crate::error::AudioError;
use async_trait::async_trait;
use bytes::Bytes;
use phonics_core::config::AudioConfig;
use phonics_core::PhonemeKey;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

const MAX_ASSET_SIZE: u64 = 10 * 1024 * 1024;

/// Maps phoneme keys to asset locations
#[derive(Debug, Clone, PartialEq)]
pub struct AssetResolver {
    root: String,
    extension: String,
    cache_version: u32,
}

impl AssetResolver {
    pub fn new(root: impl Into<String>, extension: impl Into<String>, cache_version: u32) -> Self {
        let root = root.into();
        Self {
            root: root.trim_end_matches('/').to_string(),
            extension: extension.into(),
            cache_version,
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(config.asset_root.clone(), config.extension.clone(), config.cache_version)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn is_remote(&self) -> bool {
        self.root.starts_with("http://") || self.root.starts_with("https://")
    }

    /// "C.mp3"
    pub fn file_name(&self, key: &PhonemeKey) -> String {
        format!("{}{}", key, self.extension)
    }

    /// Versioned locator: "{root}/{KEY}{ext}?v={version}"
    pub fn locator(&self, key: &PhonemeKey) -> String {
        format!("{}/{}?v={}", self.root, self.file_name(key), self.cache_version)
    }

    /// Filesystem path for a local asset root
    pub fn path(&self, key: &PhonemeKey) -> PathBuf {
        PathBuf::from(&self.root).join(self.file_name(key))
    }

    pub fn url(&self, key: &PhonemeKey) -> Result<Url, AudioError> {
        Url::parse(&self.locator(key)).map_err(|e| AudioError::Config(format!("Invalid asset URL: {}", e)))
    }
}

/// Source of bundled sound files
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the complete clip for a key; [`AudioError::AssetNotFound`] when absent.
    async fn fetch(&self, key: &PhonemeKey) -> Result<Bytes, AudioError>;

    /// Where the clip for `key` lives
    fn locate(&self, key: &PhonemeKey) -> String;
}

/// Assets in a local directory
pub struct FsAssets {
    resolver: AssetResolver,
}

impl FsAssets {
    pub fn new(resolver: AssetResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl AssetSource for FsAssets {
    async fn fetch(&self, key: &PhonemeKey) -> Result<Bytes, AudioError> {
        let path = self.resolver.path(key);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AudioError::AssetNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.len() > MAX_ASSET_SIZE {
            return Err(AudioError::Decode(format!(
                "{} too large ({} bytes, max {})",
                path.display(),
                metadata.len(),
                MAX_ASSET_SIZE
            )));
        }

        let data = tokio::fs::read(&path).await?;
        debug!("Read {} ({} bytes)", path.display(), data.len());
        Ok(Bytes::from(data))
    }

    fn locate(&self, key: &PhonemeKey) -> String {
        self.resolver.locator(key)
    }
}

/// Assets served over http(s)
pub struct HttpAssets {
    resolver: AssetResolver,
    client: reqwest::Client,
}

impl HttpAssets {
    pub fn new(resolver: AssetResolver, timeout: Duration) -> Result<Self, AudioError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AudioError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { resolver, client })
    }
}

#[async_trait]
impl AssetSource for HttpAssets {
    async fn fetch(&self, key: &PhonemeKey) -> Result<Bytes, AudioError> {
        let url = self.resolver.url(key)?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AudioError::AssetNotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(AudioError::Network(format!("{} returned {}", url, status)));
        }

        let data = response.bytes().await?;
        if data.len() as u64 > MAX_ASSET_SIZE {
            return Err(AudioError::Decode(format!("{} too large ({} bytes)", url, data.len())));
        }
        debug!("Fetched {} ({} bytes)", url, data.len());
        Ok(data)
    }

    fn locate(&self, key: &PhonemeKey) -> String {
        self.resolver.locator(key)
    }
}

/// Pick the filesystem or HTTP source for the configured asset root.
pub fn asset_source(config: &AudioConfig, timeout: Duration) -> Result<Arc<dyn AssetSource>, AudioError> {
    let resolver = AssetResolver::from_config(config);
    if resolver.is_remote() {
        Ok(Arc::new(HttpAssets::new(resolver, timeout)?))
    } else {
        Ok(Arc::new(FsAssets::new(resolver)))
    }
}
