//! CLI entry point for blogsmith

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "blogsmith")]
#[command(version)]
#[command(about = "A static blog generator for markdown posts", long_about = None)]
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
    /// Initialize a new blog
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post dated today
    New {
        /// Title of the new post
        title: String,

        /// Category of the new post
        #[arg(long)]
        category: Option<String>,

        /// Tag for the new post (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Disable file watching and live reload
        #[arg(long)]
        r#static: bool,
    },

    /// Remove the public folder
    Clean,

    /// List site content
    List {
        /// Type of content to list (post, category, tag, month)
        #[arg(default_value = "post")]
        r#type: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "blogsmith=debug,info"
    } else {
        "blogsmith=info"
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
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing blog in {:?}", target_dir);
            blogsmith::commands::init::init_site(&target_dir)?;
            println!("Initialized blog in {:?}", target_dir);
        }

        Commands::New {
            title,
            category,
            tags,
        } => {
            let blog = blogsmith::Blog::new(&base_dir)?;
            tracing::info!("Creating new post with title: {}", title);
            let path = blog.new_post(&title, category.as_deref(), &tags)?;
            println!("Created {:?}", path);
        }

        Commands::Generate { watch } => {
            let blog = blogsmith::Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");

            blog.generate().await?;
            println!("Generated successfully!");

            if watch {
                blogsmith::commands::generate::watch(&blog).await?;
            }
        }

        Commands::Server {
            port,
            ip,
            open,
            r#static,
        } => {
            let blog = blogsmith::Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            blogsmith::server::start(&blog, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let blog = blogsmith::Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type, json } => {
            let blog = blogsmith::Blog::new(&base_dir)?;
            blogsmith::commands::list::run(&blog, &r#type, json)?;
        }

        Commands::Version => {
            println!("blogsmith version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
