// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end for scope-aware configuration lookups.
//!
//! ```bash
//! confmgr --key-path 'site/%{site}' --key-path default \
//!     hash db --scope site=east
//! confmgr --format text field db host --scope site=east
//! confmgr load-defaults ./defaults
//! ```
//!
//! Exit status is 0 on success, 2 when the key was not found and 1 on any
//! other error.

use clap::{Parser, Subcommand, ValueEnum};
use confmgr::adapters::RedisPool;
use confmgr::domain::{LookupResult, Result, Scope, Settings};
use confmgr::service::{ConfigManager, SettingsLoader};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "confmgr")]
#[command(version, about = "Scope-aware configuration lookups", long_about = None)]
struct Cli {
    /// Settings file (default: discovered)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(short = 'd', long, default_value = "warn", global = true)]
    log_level: tracing::Level,

    /// Redis connection URL
    #[arg(long, global = true)]
    redis_url: Option<String>,

    /// Prefix of every absolute key name
    #[arg(long, global = true)]
    key_prefix: Option<String>,

    /// Search-path template, highest precedence first (repeatable)
    #[arg(long = "key-path", global = true)]
    key_paths: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a scalar
    #[command(name = "string")]
    Scalar {
        key: String,
        /// Scope variable as name=value (repeatable)
        #[arg(short, long = "scope", value_parser = parse_scope_var)]
        scope: Vec<(String, String)>,
    },
    /// Look up a merged hash
    Hash {
        key: String,
        /// Scope variable as name=value (repeatable)
        #[arg(short, long = "scope", value_parser = parse_scope_var)]
        scope: Vec<(String, String)>,
    },
    /// Look up a concatenated list
    List {
        key: String,
        /// Scope variable as name=value (repeatable)
        #[arg(short, long = "scope", value_parser = parse_scope_var)]
        scope: Vec<(String, String)>,
    },
    /// Look up one field of a hash
    Field {
        key: String,
        field: String,
        /// Scope variable as name=value (repeatable)
        #[arg(short, long = "scope", value_parser = parse_scope_var)]
        scope: Vec<(String, String)>,
    },
    /// Look up one entry of a list
    Index {
        key: String,
        #[arg(allow_negative_numbers = true)]
        index: i64,
        /// Scope variable as name=value (repeatable)
        #[arg(short, long = "scope", value_parser = parse_scope_var)]
        scope: Vec<(String, String)>,
    },
    /// Store every file in a directory as a key
    LoadDefaults {
        dir: PathBuf,
    },
    /// Check that the store is reachable
    Check,
}

fn parse_scope_var(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_lowercase(), value.to_lowercase())),
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_not_found() => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let loader = SettingsLoader::new();

    #[cfg(feature = "yaml")]
    let loader = match &cli.config {
        Some(path) => loader.with_file(path),
        None => loader.with_discovery(),
    };
    #[cfg(not(feature = "yaml"))]
    {
        if cli.config.is_some() {
            return Err(confmgr::domain::ConfmgrError::InvalidSettings {
                message: "settings files need the 'yaml' feature".to_string(),
            });
        }
    }

    #[cfg(feature = "env")]
    let loader = loader.with_env();

    let mut settings = loader.load()?;

    if let Some(url) = &cli.redis_url {
        settings.redis.url = url.clone();
    }
    if let Some(prefix) = &cli.key_prefix {
        settings.key_prefix = prefix.clone();
    }
    if !cli.key_paths.is_empty() {
        settings.key_paths = cli.key_paths.clone();
    }

    settings.validate()?;
    Ok(settings)
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    let pool = RedisPool::new(&settings.redis)?;
    let manager = ConfigManager::new(settings, pool)?;

    let result = match cli.command {
        Commands::Scalar { key, scope } => manager.lookup_string(&key, &to_scope(scope))?,
        Commands::Hash { key, scope } => manager.lookup_hash(&key, &to_scope(scope))?,
        Commands::List { key, scope } => manager.lookup_list(&key, &to_scope(scope))?,
        Commands::Field { key, field, scope } => {
            manager.lookup_hash_field(&key, &field, &to_scope(scope))?
        }
        Commands::Index { key, index, scope } => {
            manager.lookup_list_index(&key, index, &to_scope(scope))?
        }
        Commands::LoadDefaults { dir } => {
            let report = manager.load_defaults(&dir)?;
            println!("stored {}, skipped {}", report.stored, report.skipped);
            return Ok(());
        }
        Commands::Check => {
            manager.provider().check()?;
            println!("ok");
            return Ok(());
        }
    };

    print_result(&result, cli.format)
}

fn to_scope(vars: Vec<(String, String)>) -> Scope {
    vars.into_iter().collect()
}

fn print_result(result: &LookupResult, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", result.to_json()?),
        Format::Text => println!("{}", result.to_text()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope_var() {
        assert_eq!(
            parse_scope_var("Site=east").unwrap(),
            ("site".to_string(), "east".to_string())
        );
        assert_eq!(
            parse_scope_var("k=a=b").unwrap(),
            ("k".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_scope_var("Site=East").unwrap(),
            ("site".to_string(), "east".to_string())
        );
        assert!(parse_scope_var("novalue").is_err());
        assert!(parse_scope_var("=x").is_err());
    }

    #[test]
    fn test_cli_parses_lookup() {
        let cli = Cli::try_parse_from([
            "confmgr",
            "--key-path",
            "site/%{site}",
            "--key-path",
            "default",
            "index",
            "servers",
            "-1",
            "--scope",
            "site=east",
        ])
        .unwrap();
        assert_eq!(cli.key_paths, vec!["site/%{site}", "default"]);
        assert_eq!(cli.log_level, tracing::Level::WARN);
        match cli.command {
            Commands::Index { key, index, scope } => {
                assert_eq!(key, "servers");
                assert_eq!(index, -1);
                assert_eq!(scope, vec![("site".to_string(), "east".to_string())]);
            }
            _ => panic!("expected index command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["confmgr", "--format", "xml", "check"]).is_err());
    }
}
