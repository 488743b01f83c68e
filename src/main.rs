use clap::{
    Args, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use discographer::{cli, config, config::PipelineConfig, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build a playlist of an artist's albums in release order
    Build(BuildOptions),

    /// Search artists by name to find their ids
    Search(SearchOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

/// Overrides for the retry policy; unset flags keep the environment or default value.
#[derive(Args, Debug, Clone)]
pub struct RetryOptions {
    /// Total attempts per request, the first one included
    #[clap(long)]
    pub max_attempts: Option<u32>,

    /// Delay before the first retry, in milliseconds
    #[clap(long)]
    pub base_backoff_ms: Option<u64>,

    /// Upper bound of a single backoff delay, in milliseconds
    #[clap(long)]
    pub max_backoff_ms: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildOptions {
    /// Spotify artist id (see `discographer search`)
    #[clap(long)]
    pub artist_id: String,

    /// Playlist name [default: "<artist> discography"]
    #[clap(long)]
    pub name: Option<String>,

    /// Number of albums fetched in parallel
    #[clap(long)]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub retry: RetryOptions,

    /// Publish the fetched albums even if some failed
    #[clap(long)]
    pub allow_partial: bool,

    /// Print the album order without creating a playlist
    #[clap(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Artist name to look for
    pub query: String,

    /// Maximum number of artists to show
    #[clap(long, default_value_t = 10)]
    pub limit: usize,

    #[command(flatten)]
    pub retry: RetryOptions,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

/// Environment and defaults, then command-line overrides.
fn pipeline_config(retry: &RetryOptions, workers: Option<usize>) -> PipelineConfig {
    let mut config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot read pipeline settings. Err: {}", e),
    };

    if let Some(workers) = workers {
        config.worker_pool_size = workers;
    }
    if let Some(max_attempts) = retry.max_attempts {
        config.max_attempts = max_attempts;
    }
    if let Some(base) = retry.base_backoff_ms {
        config.base_backoff_ms = base;
    }
    if let Some(max) = retry.max_backoff_ms {
        config.max_backoff_ms = max;
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
    }
    config
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build(opt) => {
            let config = pipeline_config(&opt.retry, opt.workers);
            let request = cli::BuildRequest {
                artist_id: opt.artist_id,
                playlist_name: opt.name,
                allow_partial: opt.allow_partial,
                dry_run: opt.dry_run,
            };
            cli::build(request, config).await
        }
        Command::Search(opt) => {
            let config = pipeline_config(&opt.retry, None);
            cli::search(opt.query, opt.limit, config).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
