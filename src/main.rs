use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use smbc_rss::{Config, ConfigError};

#[derive(Parser, Debug)]
#[command(
    name = "smbc-rss",
    version,
    about = "Builds an RSS feed of SMBC comics with hover text and votey images inlined"
)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, value_name = "FILE", default_value = "smbc-config.json")]
    file: PathBuf,

    /// Override the number of source entries considered
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match Config::load(&args.file) {
        Ok(config) => config,
        Err(e @ ConfigError::Missing(_)) => {
            // One line per missing directive, nothing else
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load {}", args.file.display()));
        }
    };

    if let Some(limit) = args.limit {
        config.item_limit = usize::try_from(limit).context("--limit is too large")?;
    }

    let summary = smbc_rss::run(&config)
        .await
        .context("Feed generation failed")?;

    for item in &summary.items {
        println!("\nLink: {}", item.link);
        println!("  - Comic: {}", item.comic_image_url);
        println!("  - Title: {}", item.hover_text);
        println!("  - Votey: {}", item.votey_image_url);
    }

    if !summary.failures.is_empty() {
        eprintln!();
        eprintln!("Skipped {} entries:", summary.failures.len());
        for failure in &summary.failures {
            eprintln!("  - {}", failure);
        }
    }

    println!(
        "\nWrote {} items to {}",
        summary.items.len(),
        summary.output_path.display()
    );
    Ok(())
}
