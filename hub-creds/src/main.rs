//! hub-creds - Credential management tool for SocialHub
//!
//! Stores the single credential record shared by every platform publisher.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libsocialhub::credentials::{mask, CREDENTIAL_FIELDS};
use libsocialhub::error::{StoreError, ValidationError};
use libsocialhub::logging::LoggingConfig;
use libsocialhub::{Config, PlatformCredentials, PlatformId, SocialHub, SocialHubError};
use std::io::{self, Read, Write};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "hub-creds")]
#[command(version, about = "Manage SocialHub platform credentials securely", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store credentials, merging them into the saved record
    Set {
        /// Only prompt for this platform's fields (bluesky, x, threads)
        #[arg(short, long)]
        platform: Option<String>,

        /// Read a JSON object of credential fields from stdin (for automation/agents)
        #[arg(long)]
        stdin: bool,
    },

    /// Show saved credentials with secrets masked
    Show,

    /// Exit 0 if a credential record exists, 1 otherwise
    Check,

    /// Delete the saved credential record
    Delete {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("warn", cli.verbose).init();

    match run_command(cli.command) {
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

fn run_command(command: Commands) -> Result<i32> {
    let hub = SocialHub::from_config(Config::load()?)?;

    match command {
        Commands::Set { platform, stdin } => {
            let platform = platform.as_deref().map(parse_platform).transpose()?;
            set_credentials(&hub, platform, stdin)
        }
        Commands::Show => show_credentials(&hub),
        Commands::Check => Ok(check_credentials(&hub)),
        Commands::Delete { force } => delete_credentials(&hub, force),
    }
}

fn parse_platform(name: &str) -> Result<PlatformId, SocialHubError> {
    let platforms = PlatformId::parse_list(name)?;
    match platforms.into_iter().collect::<Vec<_>>().as_slice() {
        [platform] => Ok(*platform),
        _ => Err(ValidationError::UnknownPlatform(name.to_string()).into()),
    }
}

/// Saved record, or an empty one when nothing has been stored yet
fn existing_record(hub: &SocialHub) -> Result<PlatformCredentials> {
    match hub.load_credentials() {
        Ok(credentials) => Ok(credentials),
        Err(SocialHubError::Store(StoreError::NotFound(_))) => Ok(PlatformCredentials::default()),
        Err(e) => Err(e.into()),
    }
}

fn set_credentials(hub: &SocialHub, platform: Option<PlatformId>, use_stdin: bool) -> Result<i32> {
    let mut credentials = existing_record(hub)?;

    if use_stdin {
        // Explicit stdin mode: for automation/agents
        let mut buffer = Zeroizing::new(String::new());
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read credentials from stdin")?;
        apply_json(&mut credentials, &buffer, platform)?;
    } else {
        if !atty::is(atty::Stream::Stdin) {
            anyhow::bail!(
                "Not a TTY. Use --stdin flag to read credentials from stdin for automation."
            );
        }
        prompt_fields(&mut credentials, platform)?;
    }

    hub.save_credentials(&credentials)?;

    let configured = credentials.configured_platforms();
    println!("✓ Stored credentials using {} backend", hub.backend_name());
    if configured.is_empty() {
        println!("No platform is fully configured yet");
    } else {
        let names: Vec<&str> = configured.iter().map(PlatformId::as_str).collect();
        println!("Configured platforms: {}", names.join(", "));
    }

    Ok(0)
}

/// Merge a JSON object of `field: value` pairs into `credentials`
fn apply_json(
    credentials: &mut PlatformCredentials,
    input: &str,
    platform: Option<PlatformId>,
) -> Result<()> {
    let fields: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(input.trim()).context("stdin must hold a JSON object")?;

    for (name, value) in fields {
        let owner = CREDENTIAL_FIELDS
            .iter()
            .find(|(field, _, _)| *field == name)
            .map(|(_, owner, _)| *owner)
            .ok_or_else(|| anyhow::anyhow!("Unknown credential field '{}'", name))?;

        if platform.is_some_and(|p| p != owner) {
            anyhow::bail!("Field '{}' does not belong to {}", name, owner);
        }

        let value = value
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Field '{}' must be a string", name))?;
        credentials.set_field(&name, value.trim().to_string());
    }

    Ok(())
}

/// Ask for each field in turn; an empty answer keeps the saved value
fn prompt_fields(
    credentials: &mut PlatformCredentials,
    platform: Option<PlatformId>,
) -> Result<()> {
    println!("Press Enter to keep a saved value.");

    for (name, owner, secret) in CREDENTIAL_FIELDS {
        if platform.is_some_and(|p| p != owner) {
            continue;
        }

        let current = credentials.field(name).unwrap_or_default();
        let shown = if secret || current.is_empty() {
            mask(current)
        } else {
            current.to_string()
        };
        let prompt = format!("{} [{}]: ", name, shown);

        let value = if secret {
            Zeroizing::new(rpassword::prompt_password(&prompt)?)
        } else {
            print!("{}", prompt);
            io::stdout().flush()?;
            let mut line = Zeroizing::new(String::new());
            io::stdin().read_line(&mut line)?;
            line
        };

        let value = value.trim();
        if !value.is_empty() {
            credentials.set_field(name, value.to_string());
        }
    }

    Ok(())
}

fn show_credentials(hub: &SocialHub) -> Result<i32> {
    let credentials = hub.load_credentials()?;

    println!("Backend: {}", hub.backend_name());

    for platform in PlatformId::ALL {
        let missing = credentials.missing_fields(platform);
        let status = if missing.is_empty() {
            "configured"
        } else {
            "incomplete"
        };
        println!("\n{} ({})", platform.display_name(), status);

        for (name, owner, secret) in CREDENTIAL_FIELDS {
            if owner != platform {
                continue;
            }
            let value = credentials.field(name).unwrap_or_default();
            let shown = if secret || value.is_empty() {
                mask(value)
            } else {
                value.to_string()
            };
            println!("  {}: {}", name, shown);
        }
    }

    Ok(0)
}

fn check_credentials(hub: &SocialHub) -> i32 {
    if hub.credentials_exist() {
        println!("✓ Credentials found ({} backend)", hub.backend_name());
        0
    } else {
        println!("✗ No credentials saved. Run 'hub-creds set' first.");
        1
    }
}

fn delete_credentials(hub: &SocialHub, force: bool) -> Result<i32> {
    if !hub.credentials_exist() {
        println!("No credentials found");
        return Ok(0);
    }

    // Confirm deletion unless --force is used
    if !force && atty::is(atty::Stream::Stdin) {
        print!("Delete all saved credentials? [y/N]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled");
            return Ok(0);
        }
    }

    hub.delete_credentials()?;
    println!("✓ Deleted credentials");

    Ok(0)
}
