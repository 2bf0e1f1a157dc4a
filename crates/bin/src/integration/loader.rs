//! Artifact loading with progress reporting.
//!
//! Fetches the model dump and both tables, then decodes them into the
//! dashboard context. Every failure here is fatal for the process.

use credence::DashboardContext;
use credence_data::cache::default_cache_dir;
use credence_data::{ArtifactFetcher, ArtifactKind, ArtifactSource, FetchConfig, RawArtifacts, SourceConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Error type for startup loading.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LoadError {
    /// Artifact could not be fetched.
    #[error("Failed to fetch {kind}: {source}")]
    Fetch {
        /// Artifact being fetched
        kind: ArtifactKind,
        /// Underlying failure
        source: credence_data::DataError,
    },
    /// Fetcher could not be created.
    #[error("Data error: {0}")]
    Data(#[from] credence_data::DataError),
    /// Artifacts could not be decoded or are inconsistent.
    #[error("Failed to build dashboard: {0}")]
    Dashboard(#[from] credence::DashboardError),
}

/// Print where artifacts come from and the cache status.
pub(crate) fn print_source_info(source: &SourceConfig, fetch: &FetchConfig) {
    match &source.source {
        ArtifactSource::Remote { base_url, revision } => {
            eprintln!("Source: {} @ {}", base_url, revision);
            if fetch.use_cache {
                eprintln!("  Cache: {}", default_cache_dir().display());
                if fetch.force_refresh {
                    eprintln!("  Mode: Force refresh (re-fetching all data)");
                }
            } else {
                eprintln!("  Cache: Disabled");
            }
        }
        ArtifactSource::Local(dir) => eprintln!("Source: {}", dir.display()),
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

/// Fetch every artifact and build the context.
pub(crate) async fn load_context(
    source: SourceConfig,
    fetch: FetchConfig,
) -> Result<DashboardContext, LoadError> {
    let revision = match &source.source {
        ArtifactSource::Remote { revision, .. } => Some(revision.clone()),
        ArtifactSource::Local(_) => None,
    };
    let fetcher = ArtifactFetcher::new(source, fetch)?;

    let mut raw = RawArtifacts::default();
    for kind in ArtifactKind::ALL {
        let pb = spinner(format!("Fetching {}...", kind.label()));
        match fetcher.fetch(kind).await {
            Ok(bytes) => {
                pb.finish_with_message(format!("{} ✓ ({} bytes)", kind.label(), bytes.len()));
                raw.insert(kind, bytes);
            }
            Err(source) => {
                pb.finish_with_message(format!("{} ✗", kind.label()));
                return Err(LoadError::Fetch { kind, source });
            }
        }
    }

    let pb = spinner("Scoring and explaining every client...".to_string());
    let ctx = match DashboardContext::from_artifacts(&raw) {
        Ok(ctx) => {
            pb.finish_with_message(format!("{} clients ready ✓", ctx.len()));
            ctx
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    Ok(match revision {
        Some(revision) => ctx.with_revision(revision),
        None => ctx,
    })
}
