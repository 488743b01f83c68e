//! Discographer Library
//!
//! Builds a chronologically ordered track list of an artist's album
//! discography from the Spotify catalog and hands it to a playlist. The
//! heart of the crate is the resilient aggregation pipeline: paginated album
//! discovery, parallel track retrieval on a bounded worker pool, retry with
//! backoff under rate limiting, and deterministic chronological assembly.
//!
//! # Modules
//!
//! - `catalog` - The remote catalog interface the pipeline consumes
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by transport and pipeline
//! - `management` - Credential loading
//! - `pipeline` - Pagination, retry, album collection, track aggregation, ordering
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use discographer::{config::PipelineConfig, pipeline, spotify::SpotifyClient};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> discographer::error::Result<()> {
//!     let client = Arc::new(SpotifyClient::new("BQC..."));
//!     let outcome = pipeline::build_discography(
//!         client,
//!         "4NHQUGzhtTLFvgF5SZesLK",
//!         &PipelineConfig::default(),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//!     println!("{} tracks", outcome.track_uris().len());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod pipeline;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints a status line prefixed with a blue `o`.
///
/// ```
/// info!("Collecting albums for {}", artist_name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a status line prefixed with a green check mark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints to stderr with a red `!` and exits with status 1.
///
/// Only for the binary's top level; library code returns errors instead.
///
/// ```
/// error!("Cannot build discography: {}", err);
/// // never reached
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints to stderr with a yellow `!` and carries on.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
