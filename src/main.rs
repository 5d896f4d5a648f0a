use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use imgsearch::{search, AppContext, SearchConfig, SearchView, UserAction};
use tracing_subscriber::EnvFilter;

/// Search the product-image catalog from the terminal.
#[derive(Parser, Debug)]
#[command(name = "imgsearch", version, about)]
struct Cli {
    /// Pipeline configuration (YAML).
    #[arg(short, long, env = "IMGSEARCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search with a text query.
    Text { query: String },
    /// Search with an image file (jpg or png).
    Image { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = SearchConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let action = match cli.command {
        Command::Text { query } => UserAction::TextSearch(query),
        Command::Image { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("reading image {}", path.display()))?;
            UserAction::ImageUpload(bytes)
        }
    };

    let ctx = AppContext::from_config(&config)
        .await
        .context("initializing search context")?;

    let view = SearchView::from_result(search(&ctx, action).await, config.ui.columns_per_row);
    match &view {
        SearchView::Results { grid } => println!("{}", render::text::render_grid(grid)),
        SearchView::Failed { message, .. } => {
            eprintln!("{message}");
            std::process::exit(1);
        }
        SearchView::Rejected { message } | SearchView::Empty { message } => println!("{message}"),
    }

    Ok(())
}
