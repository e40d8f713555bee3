//! # Match Centre Scraper CLI
//!
//! This module implements the command-line interface for the scraper,
//! providing two subcommands:
//!
//! - `scrape`: run the full extraction pipeline against a match URL and
//!   write the canonical envelope plus a text summary to disk
//! - `diagnose`: load the page once and report what data is actually
//!   present, without any LLM cost; the first thing to reach for when a
//!   scrape keeps coming back empty
//!
//! Exit codes: 0 on success or user interruption, 1 on an invalid URL,
//! 2 when every selector and retry round is exhausted, 3 on a disk write
//! failure, 4 on anything unexpected.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use matchcentre::browser::PageAnalysis;
use matchcentre::config::ScrapeConfig;
use matchcentre::urls::validate_match_url;
use matchcentre::{Error, pipeline};

#[derive(Parser)]
#[command(author, version, about = "WhoScored match centre timeline scraper", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape a match page and write the timeline envelope
    Scrape(ScrapeArgs),

    /// Analyze what a match page actually contains, without any LLM calls
    Diagnose(DiagnoseArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// Match URL (defaults to MATCH_URL from the environment)
    url: Option<String>,

    /// Output JSON path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// LLM model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum retry rounds over the whole selector sequence
    #[arg(short, long)]
    retries: Option<u32>,

    /// Delay between retry rounds in seconds
    #[arg(short, long)]
    delay: Option<f64>,

    /// Page load timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Require rating/percentage signals during validation
    #[arg(long)]
    enhanced: bool,

    /// Run the browser with a visible window
    #[arg(long)]
    headful: bool,
}

#[derive(Args, Debug)]
struct DiagnoseArgs {
    /// Match URL (defaults to MATCH_URL from the environment)
    url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scrape(args)) => scrape_command(args).await,
        Some(Commands::Diagnose(args)) => diagnose_command(args).await,
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["matchcentre", "--help"]);
            ExitCode::SUCCESS
        }
    }
}

fn print_banner() {
    println!("========================================");
    println!(" WhoScored Match Centre Timeline Scraper");
    println!("========================================");
    println!();
}

async fn scrape_command(args: ScrapeArgs) -> ExitCode {
    let mut config = ScrapeConfig::from_env();
    if let Some(url) = args.url {
        config.match_url = url;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    if let Some(retries) = args.retries {
        config.retry.max_rounds = retries;
    }
    if let Some(delay) = args.delay {
        config.retry.request_delay = Duration::from_secs_f64(delay);
    }
    if let Some(timeout) = args.timeout {
        config.browser.page_timeout = Duration::from_secs(timeout);
    }
    config.validation.enhanced = args.enhanced;
    config.browser.headless = !args.headful;

    print_banner();
    println!("Target URL:  {}", config.match_url);
    println!("Output file: {}", config.output_path.display());
    println!();
    println!("Starting data extraction...");

    let outcome = tokio::select! {
        result = pipeline::run(&config) => result,
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("Scraping interrupted by user");
            return ExitCode::SUCCESS;
        }
    };

    match outcome {
        Ok(outcome) => {
            println!("Success! Data saved to {}", outcome.json_path.display());
            println!();
            println!("{}", outcome.report);
            println!("Summary report saved to {}", outcome.summary_path.display());
            ExitCode::SUCCESS
        }
        Err(err) => failure_exit(err, &config),
    }
}

fn failure_exit(err: Error, config: &ScrapeConfig) -> ExitCode {
    match err {
        Error::InvalidUrl(url) => {
            eprintln!("Invalid WhoScored match URL: {url}");
            eprintln!("Expected format: https://www.whoscored.com/matches/<id>/live/<match-slug>");
            ExitCode::from(1)
        }
        Error::NoData(message) => {
            eprintln!("No data was extracted from the match page: {message}");
            eprintln!();
            eprintln!("Possible reasons:");
            eprintln!("- Match page not accessible");
            eprintln!("- Page structure changed");
            eprintln!("- Network connectivity issues");
            eprintln!("- Rate limiting or blocking");
            eprintln!();
            eprintln!(
                "Try: matchcentre diagnose {} to see what the page actually contains",
                config.match_url
            );
            ExitCode::from(2)
        }
        Error::Storage(message) => {
            eprintln!("Failed to save extracted data: {message}");
            eprintln!(
                "Check that {} is writable and has free space",
                config.output_path.display()
            );
            ExitCode::from(3)
        }
        other => {
            eprintln!("Unexpected error: {other}");
            if config.llm.api_key.is_empty() {
                eprintln!("Hint: OPENAI_API_KEY is not set");
            }
            ExitCode::from(4)
        }
    }
}

async fn diagnose_command(args: DiagnoseArgs) -> ExitCode {
    let mut config = ScrapeConfig::from_env();
    if let Some(url) = args.url {
        config.match_url = url;
    }

    println!("Match Page Diagnostic");
    println!("=====================");
    println!("Analyzing: {}", config.match_url);
    println!();

    if !validate_match_url(&config.match_url) {
        eprintln!("Invalid WhoScored match URL: {}", config.match_url);
        return ExitCode::from(1);
    }

    match pipeline::diagnose(&config).await {
        Ok(analysis) => {
            print_analysis(&analysis, &config);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Diagnostic failed: {err}");
            ExitCode::from(4)
        }
    }
}

fn print_analysis(analysis: &PageAnalysis, config: &ScrapeConfig) {
    println!(
        "Page loaded successfully ({} characters)",
        analysis.content_length
    );
    println!();

    println!("KEYWORD ANALYSIS:");
    for (keyword, count) in &analysis.keyword_hits {
        println!("  - '{keyword}': {count} occurrences");
    }
    println!();

    println!("RATING DATA:");
    println!(
        "  - Potential player ratings (5.0-9.9): {}",
        analysis.rating_signals
    );
    if !analysis.rating_examples.is_empty() {
        println!("    Examples: {}", analysis.rating_examples.join(", "));
    }
    println!("  - Percentage values: {}", analysis.percent_signals);
    println!();

    println!("CSS SELECTOR ANALYSIS:");
    println!(
        "  - Selectors present: {}/{}",
        analysis.selectors_present.len(),
        config.selectors.all().count()
    );
    for selector in analysis.selectors_present.iter().take(5) {
        println!("    + {selector}");
    }
    println!();

    println!("ASSESSMENT:");
    if analysis.has_match_content() {
        println!("  Page contains detailed data - the scraper should work.");
    } else if analysis.total_keyword_hits() > 20 {
        println!("  Page has match content but may lack detailed ratings.");
        println!("  This is expected for older or completed matches.");
    } else {
        println!("  Page appears to lack timeline/rating data.");
        println!("  Try a more recent match URL, or check whether the site");
        println!("  structure changed and the selectors need updating.");
    }
}
