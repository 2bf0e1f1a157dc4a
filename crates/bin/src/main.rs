//! Credence CLI binary.
//!
//! Loads the scoring artifacts once and renders dashboard views either as
//! one-shot subcommands or from an interactive shell.

mod integration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use credence_data::source::{
    DEFAULT_BASE_URL, DEFAULT_CLIENTS_FILE, DEFAULT_FEATURES_FILE, DEFAULT_MODEL_FILE,
    DEFAULT_REVISION,
};
use credence_data::{ArtifactSource, FetchConfig, SourceConfig};
use integration::commands::{ViewCommand, execute};
use integration::loader::{load_context, print_source_info};
use integration::present::OutputSettings;
use integration::shell::run_shell;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MODEL_DUMP_HELP: &str = "\
The model is LightGBM's JSON dump. To produce it from a pickled classifier:

    python -c \"import json, pickle; m = pickle.load(open('lgbm_model.pkl', 'rb')); \\
b = getattr(m, 'booster_', m); json.dump(b.dump_model(), open('lgbm_model.json', 'w'))\"

then serve it with the tables from a directory:

    credence --data-dir ./artifacts --model-file lgbm_model.json shell";

#[derive(Parser)]
#[command(name = "credence")]
#[command(about = "Credence: explainable credit scoring dashboard", long_about = None)]
#[command(version)]
#[command(after_long_help = MODEL_DUMP_HELP)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where the artifacts come from and where results go.
#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// Read artifacts from a local directory instead of the pinned remote
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Raw-content base URL of the artifact repository
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Artifact revision (commit hash or tag)
    #[arg(long, global = true, default_value = DEFAULT_REVISION)]
    revision: String,

    /// Model dump file name (LightGBM `dump_model()` JSON)
    #[arg(long, global = true, default_value = DEFAULT_MODEL_FILE)]
    model_file: String,

    /// Client table file name
    #[arg(long, global = true, default_value = DEFAULT_CLIENTS_FILE)]
    clients_file: String,

    /// Feature table file name
    #[arg(long, global = true, default_value = DEFAULT_FEATURES_FILE)]
    features_file: String,

    /// Disable caching (always fetch fresh data)
    #[arg(long, global = true)]
    no_cache: bool,

    /// Force refresh cached data
    #[arg(long, global = true)]
    refresh: bool,

    /// Directory charts are written to
    #[arg(long, global = true, default_value = "credence-output")]
    output_dir: PathBuf,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl SourceArgs {
    fn source_config(&self) -> SourceConfig {
        let source = match &self.data_dir {
            Some(dir) => ArtifactSource::Local(dir.clone()),
            None => ArtifactSource::Remote {
                base_url: self.base_url.clone(),
                revision: self.revision.clone(),
            },
        };
        SourceConfig {
            source,
            model_file: self.model_file.clone(),
            clients_file: self.clients_file.clone(),
            features_file: self.features_file.clone(),
        }
    }

    const fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            use_cache: !self.no_cache,
            force_refresh: self.refresh,
        }
    }

    fn output_settings(&self) -> OutputSettings {
        OutputSettings {
            dir: self.output_dir.clone(),
            format: self.format,
        }
    }
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable tables
    Text,
    /// JSON report envelope
    Json,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    View(ViewCommand),

    /// Load the data once and read commands from standard input
    Shell,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let source = cli.source.source_config();
    let settings = cli.source.output_settings();

    print_source_info(&source, &cli.source.fetch_config());
    let ctx = load_context(source, cli.source.fetch_config()).await?;

    match cli.command {
        Commands::View(command) => execute(&ctx, &command, &settings)?,
        Commands::Shell => run_shell(&ctx, &settings)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_use_pinned_remote() {
        let cli = Cli::try_parse_from(["credence", "clients"]).unwrap();
        let source = cli.source.source_config();
        assert_eq!(
            source.source,
            ArtifactSource::Remote {
                base_url: DEFAULT_BASE_URL.to_string(),
                revision: DEFAULT_REVISION.to_string(),
            }
        );
        assert!(cli.source.fetch_config().use_cache);
        assert_eq!(cli.source.format, OutputFormat::Text);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "credence", "score", "100001", "--data-dir", "data", "--format", "json",
        ])
        .unwrap();
        assert_eq!(
            cli.source.source_config().source,
            ArtifactSource::Local(PathBuf::from("data"))
        );
        assert_eq!(cli.source.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::View(ViewCommand::Score(_))));
    }

    #[test]
    fn test_long_help_explains_model_dump() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("dump_model()"));
        assert!(help.contains("--model-file"));
    }

    #[test]
    fn test_local_model_dump() {
        let cli = Cli::try_parse_from([
            "credence", "--data-dir", "artifacts", "--model-file", "model_dump.json", "clients",
        ])
        .unwrap();
        let source = cli.source.source_config();
        assert_eq!(source.source, ArtifactSource::Local(PathBuf::from("artifacts")));
        assert_eq!(source.model_file, "model_dump.json");
        assert_eq!(source.clients_file, DEFAULT_CLIENTS_FILE);
    }

    #[test]
    fn test_cache_switches() {
        let cli = Cli::try_parse_from(["credence", "--no-cache", "--refresh", "shell"]).unwrap();
        let fetch = cli.source.fetch_config();
        assert!(!fetch.use_cache);
        assert!(fetch.force_refresh);
        assert!(matches!(cli.command, Commands::Shell));
    }
}
