//! xplore - browse a directory tree over HTTP
//!
//! Serves directory listings, file previews and disk usage for one root
//! directory, and can render an offline HTML tree map of it.

mod filesystem;
mod protocol;
mod server;
mod sitemap;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use filesystem::config::{ExplorerConfig, DEFAULT_PORT};
use filesystem::FileSystemService;

#[derive(Parser, Debug)]
#[command(name = "xplore")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Directory to serve (defaults to the working directory)
    root: Option<PathBuf>,

    /// Port to listen on; the PORT environment variable takes precedence
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory holding the browser front-end
    #[arg(long, value_name = "DIR", default_value = "public")]
    static_dir: PathBuf,

    /// Give up on document conversion after this many seconds
    #[arg(long, value_name = "SECS")]
    convert_timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Write a static HTML tree map of a directory
    Tree {
        /// Directory to map (defaults to the working directory)
        root: Option<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "treeview.html")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Tree { root, output }) => {
            let root = root_or_cwd(root)?;
            sitemap::write_tree(&root, &output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Generated HTML: {}", output.display());
        }
        None => {
            let mut config = ExplorerConfig::with_root(root_or_cwd(cli.root)?);
            config.port = cli.port;
            config.static_dir = cli.static_dir;
            config.convert_timeout = cli.convert_timeout.map(std::time::Duration::from_secs);
            config.apply_env_overrides();
            config.validate()?;

            let service = FileSystemService::new(config)
                .context("failed to resolve the root directory")?;
            server::run(service).await?;
        }
    }

    Ok(())
}

fn root_or_cwd(root: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("failed to read the working directory"),
    }
}
