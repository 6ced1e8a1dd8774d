use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod apis;
mod config;
mod output;
mod search;

use apis::arxiv::{ArxivClient, QuerySpec};
use config::SearchConfig;

/// Search arXiv for papers matching a keyword and print the most recent
/// submissions.
#[derive(Debug, Parser)]
#[command(name = "arxiv-search", version, about)]
struct Cli {
    /// Search keyword, matched against all paper fields
    keyword: String,

    /// Maximum number of results to display
    #[arg(
        short = 'n',
        long,
        default_value_t = config::DEFAULT_MAX_RESULTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_results: u32,

    /// Keep only papers with a matching author name
    #[arg(long)]
    author: Option<String>,

    /// Keep only papers whose title contains this text
    #[arg(long)]
    title_contains: Option<String>,

    /// Reorder results by keyword frequency in the abstract
    #[arg(long)]
    rank_by: Option<String>,

    /// Abstract preview length in characters
    #[arg(long, default_value_t = config::DEFAULT_PREVIEW_CHARS)]
    preview_chars: usize,

    /// Print records as pretty JSON instead of text blocks
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(
        !cli.keyword.trim().is_empty(),
        "search keyword must not be empty"
    );
    let config = SearchConfig {
        max_results: cli.max_results,
        preview_chars: cli.preview_chars,
    };

    let spec = QuerySpec::new(&cli.keyword, config.max_results);
    tracing::info!("Searching arXiv for {:?}", spec.keyword);

    let client = ArxivClient::new();
    let mut records = client
        .search(&spec)
        .await
        .context("arXiv search failed")?;
    tracing::info!("Feed yielded {} papers", records.len());

    if let Some(ref author) = cli.author {
        records = search::filter_by_author(records, author);
    }
    if let Some(ref needle) = cli.title_contains {
        records = search::filter_by_title(records, needle);
    }
    if let Some(ref keyword) = cli.rank_by {
        records = search::rank_by_keyword(records, keyword);
    }

    if records.is_empty() {
        println!("No papers found.");
        return Ok(());
    }

    if cli.json {
        let json = output::render_json(&records).context("failed to serialize results")?;
        println!("{}", json);
    } else {
        print!("{}", output::render_text(&records, config.preview_chars));
    }

    Ok(())
}
