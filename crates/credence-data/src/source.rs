//! Artifact locations and fetching.
//!
//! The dashboard needs three artifacts: the model dump, the client table and
//! the feature table. They come either from a remote repository pinned to a
//! revision or from a local directory. Remote fetches are cached on disk per
//! revision. There is no retry: a failed fetch aborts startup.

use crate::cache::ArtifactCache;
use crate::error::{DataError, Result};
use std::fmt;
use std::path::PathBuf;

/// Raw-content URL of the artifact repository.
pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/StevPav/Streamlit-to-Heroku";

/// Pinned revision of the artifact repository.
pub const DEFAULT_REVISION: &str = "7d55ef87619bd98f55195541061e84c9de012e6e";

/// Default model dump file name.
pub const DEFAULT_MODEL_FILE: &str = "lgbm_model.json";

/// Default client table file name.
pub const DEFAULT_CLIENTS_FILE: &str = "df_app.csv";

/// Default feature table file name.
pub const DEFAULT_FEATURES_FILE: &str = "df_test.csv";

/// The three startup artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Tree ensemble dump
    Model,
    /// Client attribute table
    Clients,
    /// Model input table
    Features,
}

impl ArtifactKind {
    /// All artifacts, in load order.
    pub const ALL: [Self; 3] = [Self::Model, Self::Clients, Self::Features];

    /// Human-readable name.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Clients => "client table",
            Self::Features => "feature table",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where artifacts are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    /// Remote repository at a pinned revision.
    Remote {
        /// Raw-content base URL
        base_url: String,
        /// Revision (commit hash or tag)
        revision: String,
    },
    /// Local directory containing the artifact files.
    Local(PathBuf),
}

impl Default for ArtifactSource {
    fn default() -> Self {
        Self::Remote {
            base_url: DEFAULT_BASE_URL.to_string(),
            revision: DEFAULT_REVISION.to_string(),
        }
    }
}

/// Artifact source plus file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Where the files live
    pub source: ArtifactSource,
    /// Model dump file name
    pub model_file: String,
    /// Client table file name
    pub clients_file: String,
    /// Feature table file name
    pub features_file: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source: ArtifactSource::default(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            clients_file: DEFAULT_CLIENTS_FILE.to_string(),
            features_file: DEFAULT_FEATURES_FILE.to_string(),
        }
    }
}

impl SourceConfig {
    /// File name of an artifact.
    pub fn file_name(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Model => &self.model_file,
            ArtifactKind::Clients => &self.clients_file,
            ArtifactKind::Features => &self.features_file,
        }
    }

    /// URL or path an artifact is read from.
    pub fn location(&self, kind: ArtifactKind) -> String {
        let file = self.file_name(kind);
        match &self.source {
            ArtifactSource::Remote { base_url, revision } => {
                format!("{}/{}/{}", base_url.trim_end_matches('/'), revision, file)
            }
            ArtifactSource::Local(dir) => dir.join(file).display().to_string(),
        }
    }
}

/// Configuration for data fetching.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whether to use the cache.
    pub use_cache: bool,
    /// Whether to force refresh (ignore cached entries).
    pub force_refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
        }
    }
}

/// Undecoded artifact contents.
#[derive(Debug, Clone, Default)]
pub struct RawArtifacts {
    /// Model dump (JSON)
    pub model: Vec<u8>,
    /// Client table (CSV)
    pub clients: Vec<u8>,
    /// Feature table (CSV)
    pub features: Vec<u8>,
}

impl RawArtifacts {
    /// Store the bytes of one artifact.
    pub fn insert(&mut self, kind: ArtifactKind, bytes: Vec<u8>) {
        match kind {
            ArtifactKind::Model => self.model = bytes,
            ArtifactKind::Clients => self.clients = bytes,
            ArtifactKind::Features => self.features = bytes,
        }
    }
}

/// Fetches artifacts from the configured source.
#[derive(Debug)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
    source: SourceConfig,
    cache: Option<ArtifactCache>,
    force_refresh: bool,
}

impl ArtifactFetcher {
    /// Create a fetcher using the default cache location.
    pub fn new(source: SourceConfig, fetch: FetchConfig) -> Result<Self> {
        let cache = fetch.use_cache.then(ArtifactCache::default);
        Self::with_cache(source, cache, fetch.force_refresh)
    }

    /// Create a fetcher with an explicit cache (or none).
    pub fn with_cache(
        source: SourceConfig,
        cache: Option<ArtifactCache>,
        force_refresh: bool,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("credence/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            source,
            cache,
            force_refresh,
        })
    }

    /// The source being read.
    pub const fn source(&self) -> &SourceConfig {
        &self.source
    }

    /// The cache in use, if any.
    pub const fn cache(&self) -> Option<&ArtifactCache> {
        self.cache.as_ref()
    }

    /// Fetch one artifact.
    pub async fn fetch(&self, kind: ArtifactKind) -> Result<Vec<u8>> {
        let file = self.source.file_name(kind);
        match &self.source.source {
            ArtifactSource::Local(dir) => {
                let path = dir.join(file);
                tracing::debug!(artifact = %kind, path = %path.display(), "reading local artifact");
                Ok(tokio::fs::read(&path).await?)
            }
            ArtifactSource::Remote { revision, .. } => {
                if let Some(cache) = &self.cache
                    && !self.force_refresh
                    && let Some(bytes) = cache.get(revision, file).await?
                {
                    tracing::debug!(artifact = %kind, revision = %revision, "artifact served from cache");
                    return Ok(bytes);
                }

                let bytes = self.download(&self.source.location(kind)).await?;

                if let Some(cache) = &self.cache
                    && let Err(e) = cache.put(revision, file, &bytes).await
                {
                    tracing::warn!(artifact = %kind, error = %e, "failed to cache artifact");
                }
                Ok(bytes)
            }
        }
    }

    /// Fetch all three artifacts.
    pub async fn fetch_all(&self) -> Result<RawArtifacts> {
        let mut raw = RawArtifacts::default();
        for kind in ArtifactKind::ALL {
            raw.insert(kind, self.fetch(kind).await?);
        }
        Ok(raw)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::info!(url, "downloading artifact");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locations() {
        let config = SourceConfig::default();
        assert_eq!(
            config.location(ArtifactKind::Clients),
            format!("{DEFAULT_BASE_URL}/{DEFAULT_REVISION}/df_app.csv")
        );
        assert_eq!(config.file_name(ArtifactKind::Model), DEFAULT_MODEL_FILE);
    }

    #[test]
    fn test_local_location() {
        let config = SourceConfig {
            source: ArtifactSource::Local(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(config.location(ArtifactKind::Features), "/data/df_test.csv");
    }

    #[tokio::test]
    async fn test_fetch_local_directory() {
        let dir = std::env::temp_dir().join(format!("credence-source-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DEFAULT_MODEL_FILE), b"{}").unwrap();
        std::fs::write(dir.join(DEFAULT_CLIENTS_FILE), b"a\n1\n").unwrap();
        std::fs::write(dir.join(DEFAULT_FEATURES_FILE), b"b\n2\n").unwrap();

        let config = SourceConfig {
            source: ArtifactSource::Local(dir.clone()),
            ..Default::default()
        };
        let fetcher = ArtifactFetcher::with_cache(config, None, false).unwrap();
        let raw = fetcher.fetch_all().await.unwrap();
        assert_eq!(raw.model, b"{}");
        assert_eq!(raw.clients, b"a\n1\n");
        assert_eq!(raw.features, b"b\n2\n");

        let _ = std::fs::remove_dir_all(dir);
    }

    fn unreachable_remote() -> SourceConfig {
        SourceConfig {
            source: ArtifactSource::Remote {
                base_url: "http://127.0.0.1:9".to_string(),
                revision: "abc123".to_string(),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_remote_fetch_uses_cache_unless_refreshing() {
        let root = std::env::temp_dir().join(format!("credence-remote-{}", std::process::id()));
        let cache = ArtifactCache::new(&root);
        cache
            .put("abc123", DEFAULT_CLIENTS_FILE, b"SK_ID_CURR\n100002\n")
            .await
            .unwrap();

        let cached =
            ArtifactFetcher::with_cache(unreachable_remote(), Some(cache.clone()), false).unwrap();
        assert_eq!(
            cached.fetch(ArtifactKind::Clients).await.unwrap(),
            b"SK_ID_CURR\n100002\n"
        );

        let refreshing =
            ArtifactFetcher::with_cache(unreachable_remote(), Some(cache.clone()), true).unwrap();
        assert!(matches!(
            refreshing.fetch(ArtifactKind::Clients).await,
            Err(DataError::Network(_))
        ));
        assert_eq!(
            cache.get("abc123", DEFAULT_CLIENTS_FILE).await.unwrap().as_deref(),
            Some(&b"SK_ID_CURR\n100002\n"[..])
        );

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_remote_cache_miss_downloads() {
        let root = std::env::temp_dir().join(format!("credence-miss-{}", std::process::id()));
        let fetcher =
            ArtifactFetcher::with_cache(unreachable_remote(), Some(ArtifactCache::new(&root)), false)
                .unwrap();
        assert!(matches!(
            fetcher.fetch(ArtifactKind::Model).await,
            Err(DataError::Network(_))
        ));
        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn test_missing_local_file_is_fatal() {
        let config = SourceConfig {
            source: ArtifactSource::Local(PathBuf::from("/nonexistent/credence")),
            ..Default::default()
        };
        let fetcher = ArtifactFetcher::with_cache(config, None, false).unwrap();
        assert!(matches!(
            fetcher.fetch(ArtifactKind::Model).await,
            Err(DataError::Io(_))
        ));
    }
}
