//! rostermail command-line tool.
//!
//! Reconciles an organization roster against a user directory dump and
//! prints one row per member (or just the collected email addresses).
//! Also provides helpers for inspecting name normalization and for
//! generating / validating configuration files.

mod reconcile;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rostermail_core::config::AppConfig;
use rostermail_core::{NameNormalizer, ReconcileEngine};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Match roster members to directory accounts by normalized name.
#[derive(Parser, Debug)]
#[command(
    name = "rostermail",
    version,
    about = "Reconcile an organization roster against a user directory"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Match roster members to directory accounts and print the result.
    Reconcile(reconcile::ReconcileArgs),

    /// Print the normalized key for each name.
    Normalize {
        /// Names to normalize.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./rostermail.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
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
    let config_path = config_path(cli.config.as_deref());

    match cli.command {
        Commands::Init { output } => {
            init_logging(cli.verbose, "warn");
            cmd_init(&output)
        }
        Commands::Validate => {
            init_logging(cli.verbose, "warn");
            cmd_validate(config_path.as_deref())
        }
        Commands::Reconcile(args) => {
            let engine = build_engine(cli.verbose, config_path.as_deref())?;
            reconcile::run(&engine, args).await
        }
        Commands::Normalize { names } => {
            let engine = build_engine(cli.verbose, config_path.as_deref())?;
            cmd_normalize(engine.normalizer(), &names)
        }
    }
}

/// Load the config, start logging at its level, and build the engine.
fn build_engine(verbose: u8, config_path: Option<&Path>) -> Result<ReconcileEngine> {
    let config = load_config(config_path)?;
    init_logging(verbose, &config.logging.level);
    match config_path {
        Some(path) => info!(path = %path.display(), "using configuration file"),
        None => debug!("no configuration file, using built-in defaults"),
    }
    Ok(ReconcileEngine::new(config))
}

/// `RUST_LOG` wins, then `-v`, then the configured level.
fn init_logging(verbose: u8, configured: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new(configured),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// The explicit `--config` path, else the per-user default if it exists.
fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    dirs::config_dir()
        .map(|dir| dir.join("rostermail").join("config.toml"))
        .filter(|path| path.exists())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            AppConfig::load_and_validate(path).context("failed to load configuration file")
        }
        None => Ok(AppConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_normalize(normalizer: &NameNormalizer, names: &[String]) -> Result<()> {
    for name in names {
        println!("{}\t{}", normalizer.normalize(name), name);
    }
    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# rostermail configuration
# Every setting is optional; the values below are the built-in defaults.

[logging]
# tracing filter directive; RUST_LOG and -v override it
level = "warn"

[normalize]
# Tokens dropped from names before comparison (matched without a trailing '.')
titles = ["dr", "prof", "mr", "mrs", "ms", "mx"]
# Characters treated as word separators
separators = [",", ".", "-"]
# Drop single-letter tokens such as middle initials
drop_initials = true

# Extra character folds, added to the built-in Latin table
[normalize.folds]
# "ŋ" = "ng"

[enrich]
api_url = "https://api.github.com"
timeout_secs = 10
# token_file = "/path/to/github.pat"
# token_env = "GITHUB_TOKEN"

[output]
delimiter = ","
email_separator = ";"
header = false
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!(
            "Default configuration written to {}",
            output.display()
        ))
    );
    println!();
    println!("Next steps:");
    println!("  1. Adjust titles and folds for the names in your organization");
    println!("  2. Point enrich.token_file or enrich.token_env at a GitHub token (optional)");
    println!(
        "  3. Validate with: rostermail validate --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            println!("Validating configuration: {}", path.display());
            println!();
            let config =
                AppConfig::load_from_file(path).context("failed to parse configuration")?;
            println!("  [OK] TOML structure is valid");
            config
        }
        None => {
            println!("No configuration file found; checking built-in defaults");
            println!();
            AppConfig::default()
        }
    };

    match config.validate() {
        Ok(()) => {
            println!("  [OK] All fields are valid");
        }
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    let token = match config.enrich.resolve_token(None) {
        Ok(Some(_)) => "set",
        Ok(None) => "not set (enrichment needs --pat)",
        Err(_) => "UNREADABLE",
    };

    println!();
    println!("Configuration summary:");
    println!("  Log level      : {}", config.logging.level);
    println!("  Titles         : {}", config.normalize.titles.join(", "));
    println!("  Separators     : {}", config.normalize.separators.join(" "));
    println!("  Drop initials  : {}", config.normalize.drop_initials);
    println!("  Extra folds    : {}", config.normalize.folds.len());
    println!("  GitHub API     : {}", config.enrich.api_url);
    println!("  Timeout        : {}s", config.enrich.timeout_secs);
    println!("  GitHub token   : {}", token);
    println!("  Delimiter      : {:?}", config.output.delimiter);
    println!("  Email separator: {:?}", config.output.email_separator);
    println!("  Header row     : {}", config.output.header);
    println!();
    println!("{}", style::success("Configuration is valid."));

    Ok(())
}
