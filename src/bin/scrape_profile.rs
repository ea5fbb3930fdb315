#![forbid(unsafe_code)]

//! Downloads every video still reachable through the newest Wayback Machine
//! capture of a Plays.tv profile.

use anyhow::{Context, Result};
use clap::Parser;
use playstv_archive::config::{ConfigOverrides, resolve_config};
use playstv_archive::http::UreqFetcher;
use playstv_archive::pipeline::run;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Exit status when the archive has no copy of the profile (`-1` as a byte).
const NOT_FOUND_EXIT: u8 = 255;

#[derive(Debug, Parser)]
#[command(
    name = "scrape_profile",
    version,
    about = "Scrape the Wayback Machine for archived PlaysTV content."
)]
struct Cli {
    /// PlaysTV username
    username: String,

    /// Video save location
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Read PLAYSTV_* settings from this file instead of .env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(ConfigOverrides {
        env_path: cli.env_file.clone(),
        ..ConfigOverrides::default()
    })
    .context("loading configuration")?;
    let fetcher = UreqFetcher::new(&config.user_agent);

    println!("===================================");
    println!("PlaysTV Archive Scraper");
    println!("===================================");
    println!("Profile: {}", config.profile_url(&cli.username));
    println!("Save location: {}", cli.path.display());
    println!();

    let summary = match run(&fetcher, &config, &cli.username, &cli.path) {
        Ok(summary) => summary,
        Err(err) if err.is_not_found() => {
            println!("ERROR: Archive of profile not found. Exiting...");
            return Ok(ExitCode::from(NOT_FOUND_EXIT));
        }
        Err(err) => {
            return Err(err).with_context(|| format!("scraping profile {}", cli.username));
        }
    };

    println!();
    println!("===================================");
    println!("Download complete!");
    println!("===================================");
    println!("Snapshot: {}", summary.snapshot.archive_url);
    println!("Videos: {}", summary.records.len());
    for report in &summary.downloads {
        println!("  - {} ({} bytes)", report.path.display(), report.bytes);
    }

    Ok(ExitCode::SUCCESS)
}
