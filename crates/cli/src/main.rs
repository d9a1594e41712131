// ABOUTME: CLI for collecting app reviews and listing metadata with playreviews-harvest.
// ABOUTME: Prints reviews with keyword sentiment labels, or app info, as text or JSON.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use playreviews_harvest::{AppInfo, Client, Review, ScrapeError, DEFAULT_REVIEW_COUNT};
use playreviews_sentiment::{classify, Sentiment};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "playreviews")]
#[command(about = "Collect store reviews and app metadata", long_about = None)]
struct Args {
    /// Listing page URL that package identifiers are appended to
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, global = true)]
    insecure: bool,

    /// Pause between review pages in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect reviews and label each with a sentiment
    Reviews {
        /// Package identifier, e.g. com.example.app
        package: String,

        /// Maximum number of reviews to return
        #[arg(short = 'n', long, default_value_t = DEFAULT_REVIEW_COUNT)]
        count: usize,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,

        /// Parse a saved listing page instead of fetching
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Show app name, developer and rating
    Info {
        /// Package identifier, e.g. com.example.app
        package: String,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct LabeledReview<'a> {
    #[serde(flatten)]
    review: &'a Review,
    sentiment: Sentiment,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(args: &Args) -> Result<Client, ScrapeError> {
    let mut builder = Client::builder().accept_invalid_certs(args.insecure);
    if let Some(base) = &args.base_url {
        builder = builder.base_url(base);
    }
    if let Some(ms) = args.delay_ms {
        builder = builder.page_delay(Duration::from_millis(ms));
    }
    builder.build()
}

fn render_reviews(reviews: &[Review], json: bool) -> Result<String> {
    if json {
        let labeled: Vec<LabeledReview> = reviews
            .iter()
            .map(|review| LabeledReview {
                review,
                sentiment: classify(&review.text),
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&labeled)?);
    }

    if reviews.is_empty() {
        return Ok("No reviews found.".to_string());
    }
    let blocks: Vec<String> = reviews
        .iter()
        .enumerate()
        .map(|(i, review)| {
            format!(
                "Review {}: {}\nSentiment: {}",
                i + 1,
                review.text,
                classify(&review.text)
            )
        })
        .collect();
    Ok(blocks.join("\n\n"))
}

fn render_info(info: &AppInfo, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(info)?);
    }
    let rating = info
        .rating
        .map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| "n/a".to_string());
    let count = info
        .rating_count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    Ok(format!(
        "Name: {}\nDeveloper: {}\nRating: {}\nRatings: {}",
        info.name, info.developer, rating, count
    ))
}

/// Reject a blank package before any fetch or file read.
fn require_package(package: &str) -> Result<()> {
    if package.trim().is_empty() {
        return Err(report(ScrapeError::invalid_app_id("Cli", None)));
    }
    Ok(())
}

fn run(args: &Args) -> Result<String> {
    let package = match &args.command {
        Command::Reviews { package, .. } | Command::Info { package, .. } => package,
    };
    require_package(package)?;

    let client = build_client(args).map_err(report)?;
    match &args.command {
        Command::Reviews {
            package,
            count,
            json,
            html,
        } => {
            let reviews = match html {
                Some(path) => {
                    let markup = fs::read_to_string(path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let mut reviews = client.parse_reviews_html(&markup);
                    reviews.truncate(*count);
                    reviews
                }
                None => client.collect_reviews(package, *count).map_err(report)?,
            };
            render_reviews(&reviews, *json)
        }
        Command::Info { package, json } => {
            let info = client.app_info(package).map_err(report)?;
            render_info(&info, *json)
        }
    }
}

/// Log the detailed error and keep only the short user-facing message.
fn report(err: ScrapeError) -> anyhow::Error {
    tracing::debug!(error = %err, "request failed");
    anyhow::anyhow!(err.user_message())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match run(&args) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
