use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use crate::config::Config;
use crate::store::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Blueprints,
    Resources,
    Queue,
    Tracker,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::Blueprints => "blueprints",
            Source::Resources => "resources",
            Source::Queue => "queue",
            Source::Tracker => "tracker",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Remotes {
    pub blueprints: String,
    pub resources: String,
}

impl Remotes {
    pub fn url(&self, source: Source) -> Option<&str> {
        match source {
            Source::Blueprints => Some(&self.blueprints),
            Source::Resources => Some(&self.resources),
            Source::Queue | Source::Tracker => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataService {
    cache_dir: PathBuf,
    remotes: Remotes,
    client: reqwest::Client,
}

impl DataService {
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;
        Self::with_client(
            &config.cache_dir,
            Remotes {
                blueprints: config.blueprints_url.clone(),
                resources: config.resources_url.clone(),
            },
            client,
        )
    }

    pub fn with_client(
        cache_dir: impl AsRef<Path>,
        remotes: Remotes,
        client: reqwest::Client,
    ) -> Result<Self, StoreError> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir).map_err(|e| StoreError::io(&cache_dir, e))?;
        tracing::debug!("Using cache directory {}", cache_dir.display());

        Ok(Self {
            cache_dir,
            remotes,
            client,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn path(&self, source: Source) -> PathBuf {
        self.cache_dir.join(source.file_name())
    }

    /// Cached copy only, never touches the network.
    pub fn get_cached<T: DeserializeOwned>(&self, source: Source) -> Option<T> {
        match self.read_cache(source) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Ignoring unreadable {} cache: {}", source, e);
                None
            }
        }
    }

    /// Fetches remote sources and refreshes their cache, falling back to the
    /// cached copy on any failure. Local sources just read the cache.
    pub async fn fetch_and_cache<T>(&self, source: Source) -> Option<T>
    where
        T: DeserializeOwned + Serialize,
    {
        if let Some(url) = self.remotes.url(source) {
            match self.fetch::<T>(source, url).await {
                Ok(data) => return Some(data),
                Err(e) => {
                    tracing::warn!("Fetching {} from {} failed, using cache: {}", source, url, e);
                }
            }
        }
        self.get_cached(source)
    }

    /// Cache first; only goes to the network when nothing is cached.
    pub async fn get_json<T>(&self, source: Source) -> Option<T>
    where
        T: DeserializeOwned + Serialize,
    {
        match self.get_cached(source) {
            Some(data) => Some(data),
            None => self.fetch_and_cache(source).await,
        }
    }

    pub fn save_json<T: Serialize>(&self, source: Source, data: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(data)?;
        self.write_cache(source, &body)
    }

    async fn fetch<T: DeserializeOwned>(&self, source: Source, url: &str) -> Result<T, StoreError> {
        tracing::debug!("Fetching {} from {}", source, url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status(status));
        }

        let value: serde_json::Value = response.json().await?;
        if !value.is_object() {
            return Err(StoreError::NotAnObject(source));
        }
        let body = serde_json::to_string_pretty(&value)?;
        let data = serde_json::from_value(value)?;

        if let Err(e) = self.write_cache(source, &body) {
            tracing::warn!("Could not cache {}: {}", source, e);
        }
        tracing::info!("Fetched {} from {}", source, url);
        Ok(data)
    }

    fn read_cache<T: DeserializeOwned>(&self, source: Source) -> Result<Option<T>, StoreError> {
        let path = self.path(source);
        if !path.exists() {
            return Ok(None);
        }
        let body = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    fn write_cache(&self, source: Source, body: &str) -> Result<(), StoreError> {
        let path = self.path(source);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| StoreError::io(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))
    }
}
