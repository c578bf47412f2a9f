//! gistsync command-line tool.
//!
//! Runs a one-shot gist to repository sync, and generates or validates
//! configuration files. Without `--config`, settings are read from GitHub
//! Action style environment variables (`INPUT_*`, `GITHUB_*`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gistsync_core::config::SyncConfig;
use gistsync_core::gist::GistClient;
use gistsync_core::git::GitClient;
use gistsync_core::{SyncEngine, SyncOutcome};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// gistsync command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "gistsync",
    version,
    about = "Sync files from a GitHub Gist into a git repository"
)]
struct Cli {
    /// Path to the TOML configuration file. Action environment variables are
    /// used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one sync: fetch the gist, write mapped files, commit and push.
    Sync,

    /// Validate the configuration and print a summary.
    Validate,

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./gistsync.toml")]
        output: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => {
            init_tracing("warn");
            cmd_init(&output)
        }
        Commands::Validate => cmd_validate(cli.config.as_deref()),
        Commands::Sync => cmd_sync(cli.config.as_deref()).await,
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Read the raw configuration from a file, or from the Action environment.
///
/// Tracing is installed here, once the configured `log_level` is known.
fn read_config(path: Option<&Path>) -> Result<SyncConfig> {
    let config = match path {
        Some(path) => SyncConfig::load_from_file(path)
            .with_context(|| format!("failed to load configuration file {}", path.display()))?,
        None => SyncConfig::from_action_env(|name| std::env::var(name).ok())
            .context("failed to read configuration from action inputs")?,
    };
    init_tracing(&config.log_level);
    Ok(config)
}

fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    let mut config = read_config(path)?;
    if path.is_some() {
        config
            .resolve_env_vars()
            .context("failed to resolve environment variables")?;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_sync(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    let gist_client = GistClient::new(config.gist.api_url.clone(), config.gist.token.clone())
        .context("failed to create gist API client")?;
    let git_client = GitClient::new(&config.repo.path).with_context(|| {
        format!(
            "failed to open target repository {}",
            config.repo.path.display()
        )
    })?;

    let engine = SyncEngine::new(&config, gist_client, git_client)
        .context("failed to initialize sync engine")?;
    let outcome = engine.run().await.context("gist sync failed")?;
    info!(%outcome, "sync finished");

    match &outcome {
        SyncOutcome::Committed { sha, pushed, .. } => {
            println!("Committed {}{}", sha, if *pushed { " and pushed" } else { "" });
        }
        other => println!("{}", other),
    }
    Ok(())
}

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    match config_path {
        Some(path) => println!("Validating configuration: {}", path.display()),
        None => println!("Validating configuration from action inputs"),
    }
    println!();

    let mut config = read_config(config_path).context("failed to parse configuration")?;
    println!("  [OK] Configuration structure is valid");

    if config_path.is_some() {
        // Missing secrets are warnings, not errors.
        let _ = config.resolve_env_vars();
        println!("  [OK] Environment variable references processed");
    }

    match config.validate() {
        Ok(()) => println!("  [OK] All required fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  Gist ID         : {}", config.gist.id);
    println!(
        "  Gist token      : {}",
        if config.gist.token.is_some() {
            "set"
        } else {
            "not set (public gists only)"
        }
    );
    println!("  Mapping strategy: {}", config.mapping.strategy);
    println!("  Target path     : {}", config.mapping.target_path);
    if !config.mapping.file_prefix.is_empty() {
        println!("  File prefix     : {}", config.mapping.file_prefix);
    }
    println!("  Merge strategy  : {}", config.merge.strategy);
    println!("  Delivery        : {}", config.delivery_mode());
    println!("  Repository      : {}", config.repo.path.display());
    println!(
        "  Push            : {}",
        if config.commit.push {
            format!("to '{}'", config.commit.remote)
        } else {
            "disabled".to_string()
        }
    );
    println!(
        "  Push token      : {}",
        if config.commit.token.is_some() {
            "set"
        } else {
            "not set (credential helper)"
        }
    );
    println!();
    println!("Configuration is valid.");

    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# gistsync configuration
# See documentation for all available options.

log_level = "info"

[gist]
id = "your-gist-id"
# token_env = "GIST_TOKEN"
api_url = "https://api.github.com"

[mapping]
# same_names | explicit | prefix | all_to_directory
strategy = "same_names"
target_path = "./"
# file_prefix = "gist-"

# Required for the explicit strategy: gist file name -> repository path.
# [mapping.file_mappings]
# "config.json" = "config/app.json"

[merge]
# overwrite | skip_existing | newer_only
strategy = "overwrite"

[commit]
message = "Sync from Gist {gist_id}"
user_name = "github-actions[bot]"
user_email = "github-actions[bot]@users.noreply.github.com"
create_pr = false
push = true
remote = "origin"
token_env = "GITHUB_TOKEN"

[repo]
path = "."
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Set the gist id and choose a mapping strategy");
    println!("  2. Set the referenced environment variables (GITHUB_TOKEN, etc.)");
    println!(
        "  3. Validate with: gistsync validate --config {}",
        output.display()
    );
    println!(
        "  4. Run a sync: gistsync sync --config {}",
        output.display()
    );

    Ok(())
}
