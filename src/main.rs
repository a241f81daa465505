mod content;
mod dump;
mod import;
mod migrate;
mod output;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;

use settings::Settings;

#[derive(Parser)]
#[command(name = "wp_migrate", about = "WordPress SQL dump to JSON content migration")]
struct Cli {
    /// Config file (default: ./wp_migrate.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse wp_posts / wp_postmeta dumps into blog-posts.json and pages.json
    Parse {
        /// wp_posts dump
        #[arg(long)]
        posts: Option<PathBuf>,
        /// wp_postmeta dump
        #[arg(long)]
        meta: Option<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Upsert blog-posts.json into the remote content store, keyed by slug
    Import {
        /// Posts JSON (default: <output_dir>/blog-posts.json)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Rows per upsert request
        #[arg(short = 'b', long)]
        batch_size: Option<usize>,
        /// Prepare rows and report, without touching the store
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    info!(?settings, "configuration loaded");

    let result = match cli.command {
        Commands::Parse { posts, meta, out } => {
            let posts = posts.unwrap_or_else(|| settings.posts_dump.clone());
            let meta = meta.unwrap_or_else(|| settings.meta_dump.clone());
            let out = out.unwrap_or_else(|| settings.output_dir.clone());
            let report = migrate::run(&posts, &meta, &out, &settings)?;
            report.print();
            Ok(())
        }
        Commands::Import {
            input,
            batch_size,
            dry_run,
        } => {
            if let Some(n) = batch_size {
                settings.import.batch_size = n;
            }
            let input = input.unwrap_or_else(|| settings.output_dir.join(output::POSTS_FILE));
            println!(
                "Importing posts from {} (upsert by slug, batches of {})...",
                input.display(),
                settings.import.batch_size
            );
            let summary = import::run(&input, &settings.import, dry_run).await?;
            if dry_run {
                println!("Dry run: {} rows prepared, nothing sent.", summary.prepared);
            } else {
                println!("Upserted {}/{} rows.", summary.upserted, summary.prepared);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}
