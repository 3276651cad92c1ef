//! hub-post - Publish one message to Bluesky, X and Threads

use anyhow::{Context, Result};
use clap::Parser;
use libsocialhub::error::ValidationError;
use libsocialhub::logging::LoggingConfig;
use libsocialhub::{
    exit_code_for, Config, Message, PlatformId, PublishResult, SocialHub, SocialHubError,
};
use std::collections::BTreeSet;
use std::io::Read;

#[derive(Parser, Debug)]
#[command(name = "hub-post")]
#[command(version, about = "Publish a message to Bluesky, X and Threads")]
#[command(long_about = "\
hub-post - Publish a message to Bluesky, X and Threads

USAGE:
    # Post to the platforms listed under [defaults] in the config
    hub-post \"Hello, everyone!\"

    # Pick platforms explicitly
    hub-post \"Hello\" --platform bluesky,threads
    hub-post \"Hello\" --all

    # Read the message from stdin
    echo \"Hello from a pipe\" | hub-post -p x

    # Machine-readable results
    hub-post \"Hello\" --format json | jq '.[] | select(.success) | .url'

OUTPUT:
    text - one line per successful platform on stdout (platform:url),
           failures on stderr
    json - JSON array of {platform, success, url?, error?}

EXIT CODES:
    0 - Published to every selected platform
    1 - At least one platform failed, or an operational error occurred
    2 - Every platform failed on missing or rejected credentials
    3 - Invalid input (empty message, unknown or empty platform list)
")]
struct Cli {
    /// Message to publish (reads from stdin if not provided)
    message: Option<String>,

    /// Target platform(s), comma-separated: bluesky, x, threads
    #[arg(short, long, value_name = "PLATFORMS")]
    platform: Option<String>,

    /// Publish to every supported platform
    #[arg(long, conflicts_with = "platform")]
    all: bool,

    /// Output format
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("error", cli.verbose).init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<SocialHubError>()
                .map(SocialHubError::exit_code)
                .unwrap_or(1);
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let text = read_message(cli.message)?;
    Message::new(text.as_str()).map_err(SocialHubError::from)?;

    let config = Config::load()?;
    let platforms = select_platforms(cli.platform.as_deref(), cli.all, &config)?;

    tracing::debug!("Publishing to {:?}", platforms);

    let hub = SocialHub::from_config(config)?;
    let results = hub.publish_selected(&text, platforms).await?;

    match cli.format.as_str() {
        "json" => print_json(&results)?,
        _ => print_text(&results),
    }

    Ok(exit_code_for(&results))
}

/// Message from the argument, or from stdin when none was given
fn read_message(arg: Option<String>) -> Result<String> {
    if let Some(message) = arg {
        return Ok(message);
    }

    if atty::is(atty::Stream::Stdin) {
        return Err(SocialHubError::from(ValidationError::EmptyMessage))
            .context("no message given; pass it as an argument or pipe it on stdin");
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read message from stdin")?;

    Ok(buffer.trim_end_matches(&['\n', '\r'][..]).to_string())
}

/// `--platform` list, `--all`, or the config defaults, in that order
fn select_platforms(
    platform: Option<&str>,
    all: bool,
    config: &Config,
) -> Result<BTreeSet<PlatformId>, SocialHubError> {
    let selected: BTreeSet<PlatformId> = if let Some(list) = platform {
        PlatformId::parse_list(list)?
    } else if all {
        PlatformId::ALL.into_iter().collect()
    } else {
        config.defaults.platforms.iter().copied().collect()
    };

    if selected.is_empty() {
        return Err(ValidationError::NoPlatforms.into());
    }

    Ok(selected)
}

fn print_text(results: &[PublishResult]) {
    for line in text_lines(results) {
        match line {
            Line::Out(text) => println!("{}", text),
            Line::Err(text) => eprintln!("{}", text),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Line {
    Out(String),
    Err(String),
}

/// Text-mode rendering: successes to stdout, failures to stderr
fn text_lines(results: &[PublishResult]) -> Vec<Line> {
    results
        .iter()
        .map(|result| {
            let reason = result.error.as_deref().unwrap_or("Unknown error");
            if result.is_aggregate() {
                Line::Err(format!("Error: publish dispatch failed: {}", reason))
            } else if result.success {
                match &result.url {
                    Some(url) => Line::Out(format!("{}:{}", result.platform, url)),
                    None => Line::Out(format!("{}:published", result.platform)),
                }
            } else {
                Line::Err(format!("Error: {}: {}", result.platform, reason))
            }
        })
        .collect()
}

fn print_json(results: &[PublishResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;
    println!("{}", json);
    Ok(())
}
