//! CLI command implementations

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use splice_core::config::SpliceConfig;
use splice_core::{SpliceError, list_media_files};
use splice_listing::{
    LocalDirectoryProvider, RemoteListingProvider, SegmentListProvider, SegmentListing,
};
use url::Url;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the media API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Resolve media paths beneath this directory
        #[arg(long)]
        media_root: Option<PathBuf>,
    },
    /// List the segment files of a local directory in playback order
    List {
        /// Directory to scan
        directory: PathBuf,
        /// Print `/media` URLs against this server instead of file names
        #[arg(long)]
        base_url: Option<Url>,
    },
    /// Scrape segment URLs from a remote directory listing
    Listing {
        /// URL of the directory index page
        url: Url,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut config = SpliceConfig::from_env();
    config.validate().map_err(report)?;

    match command {
        Commands::Serve {
            host,
            port,
            media_root,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if media_root.is_some() {
                config.server.media_root = media_root;
            }
            serve(config).await
        }
        Commands::List {
            directory,
            base_url,
        } => list_directory(&config, directory, base_url).await,
        Commands::Listing { url } => scrape_listing(&config, url).await,
    }
}

/// Turns core errors into CLI errors, showing only the short message for
/// mistakes the user can fix.
fn report(error: impl Into<SpliceError>) -> anyhow::Error {
    let error = error.into();
    if error.is_user_error() {
        anyhow::anyhow!(error.user_message())
    } else {
        anyhow::Error::new(error)
    }
}

async fn serve(config: SpliceConfig) -> anyhow::Result<()> {
    splice_web::run_server(config)
        .await
        .map_err(report)
        .context("Media server stopped")
}

async fn list_directory(
    config: &SpliceConfig,
    directory: PathBuf,
    base_url: Option<Url>,
) -> anyhow::Result<()> {
    let Some(base_url) = base_url else {
        let files = list_media_files(&directory).await.map_err(report)?;
        for file in files {
            println!("{}", file.name);
        }
        return Ok(());
    };

    let mut provider = LocalDirectoryProvider::new(directory, base_url);
    if let Some(root) = &config.server.media_root {
        provider = provider.with_media_root(root);
    }
    let listing = provider.segments().await?;
    print_listing(&listing);
    Ok(())
}

async fn scrape_listing(config: &SpliceConfig, url: Url) -> anyhow::Result<()> {
    let provider = RemoteListingProvider::new(url, &config.listing)?;
    let listing = provider.segments().await?;

    if listing.is_fallback() {
        eprintln!(
            "warning: no segment links found at {}; showing conventional names",
            provider.base_url()
        );
    }
    print_listing(&listing);
    Ok(())
}

fn print_listing(listing: &SegmentListing) {
    for segment in &listing.segments {
        println!("{segment}");
    }
}
