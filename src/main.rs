//! CLI entry point for updates-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use updates_rs::commands::new::NewUpdate;

#[derive(Parser)]
#[command(name = "updates-rs")]
#[command(version)]
#[command(about = "Serve markdown updates as a filterable, paginated API", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to the configured address)
        #[arg(short, long)]
        ip: Option<String>,

        /// Cache the index and rebuild it when content changes
        #[arg(short, long)]
        watch: bool,
    },

    /// List site information
    List {
        /// Type of content to list (post, tag, category)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Create a new update
    New {
        /// Title of the new update
        title: String,

        /// Slug (defaults to the slugified title)
        #[arg(short, long)]
        slug: Option<String>,

        /// One-line summary
        #[arg(long)]
        summary: Option<String>,

        /// Category
        #[arg(long)]
        category: Option<String>,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "updates_rs=debug,tower_http=debug,info"
    } else {
        "updates_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Serve { port, ip, watch } => {
            let site = updates_rs::Site::new(&base_dir)?;
            let port = port.unwrap_or(site.config.server.port);
            let ip = ip.unwrap_or_else(|| site.config.server.ip.clone());
            let watch = watch || site.config.server.watch;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            updates_rs::server::start(&site, &ip, port, watch).await?;
        }

        Commands::List { r#type } => {
            let site = updates_rs::Site::new(&base_dir)?;
            updates_rs::commands::list::run(&site, &r#type)?;
        }

        Commands::New {
            title,
            slug,
            summary,
            category,
            tags,
        } => {
            let site = updates_rs::Site::new(&base_dir)?;
            tracing::info!("Creating new update with title: {}", title);
            let update = NewUpdate {
                title,
                slug,
                summary,
                category,
                tags,
            };
            let path = updates_rs::commands::new::create_update(&site, &update)?;
            println!("Created: {}", path.display());
        }

        Commands::Version => {
            println!("updates-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
