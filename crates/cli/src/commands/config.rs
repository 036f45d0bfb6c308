use clap::Subcommand;
use ethpulse_core::{config::AppConfig, upstream::{ChainProvider, FailoverClient}};
use std::path::Path;

use super::utils::{print_error, print_info, print_success, CliError, CliResult};

const REDACTED: &str = "[hidden - use --show-sensitive to reveal]";

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate the configuration file plus environment overrides
    Validate {
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Print the effective configuration as TOML
    Show {
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,

        /// Print API keys and the encryption key instead of redacting them
        #[arg(long)]
        show_sensitive: bool,
    },

    /// Write a sample configuration file
    Generate {
        #[arg(short, long, default_value = "config/config.toml")]
        output: String,

        #[arg(long)]
        force: bool,
    },

    /// Ask the provider for the latest block through every configured credential in turn
    TestUpstream {
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },
}

pub async fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file, show_sensitive } => show_config(&file, show_sensitive),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
        ConfigCommands::TestUpstream { file } => test_upstream(&file).await,
    }
}

fn load(file: &str) -> CliResult<AppConfig> {
    AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_info(&format!("{file} not found, validating defaults and environment only"));
    } else {
        print_info(&format!("Loading configuration from {file}..."));
    }

    let config = load(file)?;
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Server: {}:{}", config.server.bind_address, config.server.bind_port);
    println!(
        "  Upstream: {} credential(s) on {}",
        config.upstream.api_keys.len(),
        config.upstream.network
    );
    println!(
        "  Ingestion: {} every {}ms, stack {}/{} (capacity/resume)",
        if config.ingest.enabled { "enabled" } else { "disabled" },
        config.ingest.fetch_interval_ms,
        config.ingest.stack_capacity,
        config.ingest.resume_threshold
    );
    println!("  Store: {}", config.store.database_url);
    println!(
        "  NL-to-SQL default provider: {}",
        config.nl2sql.default_provider.as_deref().unwrap_or("none (rule-based)")
    );

    Ok(())
}

fn redact(mut config: AppConfig) -> AppConfig {
    config.upstream.api_keys = config.upstream.api_keys.iter().map(|_| REDACTED.into()).collect();
    if config.nl2sql.default_api_key.is_some() {
        config.nl2sql.default_api_key = Some(REDACTED.into());
    }
    if config.auth.encryption_key.is_some() {
        config.auth.encryption_key = Some(REDACTED.into());
    }
    config
}

fn show_config(file: &str, show_sensitive: bool) -> CliResult<()> {
    let config = load(file)?;
    let config = if show_sensitive { config } else { redact(config) };

    let rendered =
        toml::to_string_pretty(&config).map_err(|e| CliError::Config(e.to_string()))?;
    println!("# Effective configuration ({file} + environment)\n");
    println!("{rendered}");
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# ethpulse configuration
# Every value can be overridden from the environment, e.g.
#   ETHPULSE__UPSTREAM__API_KEYS=key1,key2
#   ETHPULSE__INGEST__STACK_CAPACITY=5000

[server]
bind_address = "127.0.0.1"
bind_port = 3000
max_concurrent_requests = 256

[upstream]
network = "mainnet"
api_keys = ["YOUR_API_KEY"]
url_template = "https://eth-{network}.g.alchemy.com/v2/{key}"
timeout_seconds = 10
retry_delay_ms = 250

[ingest]
enabled = true
fetch_interval_ms = 12000
stack_capacity = 1000
resume_threshold = 800
store_input_data = false

[store]
database_url = "sqlite://data/transactions.db"
max_connections = 4

[query]
default_limit = 100
max_limit = 1000
pending_default = 10
pending_max = 100

[nl2sql]
# default_provider = "openai"
# default_api_key = "sk-..."
timeout_seconds = 20

[auth]
# At least 32 characters. Without it session credentials do not survive a restart.
# encryption_key = "change-me-change-me-change-me-change-me"
session_ttl_seconds = 86400
purge_interval_seconds = 300

[logging]
level = "info"
format = "pretty"

[metrics]
enabled = true
"#;

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration generated: {output}"));
    print_info("Replace YOUR_API_KEY with a real provider key before starting the server");
    Ok(())
}

async fn test_upstream(file: &str) -> CliResult<()> {
    let config = load(file)?;
    config.validate().map_err(CliError::Config)?;

    let client = FailoverClient::from_config(&config.upstream)?;
    print_info(&format!(
        "Testing {} credential(s) on {}...",
        client.credentials().len(),
        config.upstream.network
    ));

    match client.latest_block_number().await {
        Ok(block) => {
            print_success(&format!("Latest block: {block}"));
            Ok(())
        }
        Err(e) => {
            print_error("Provider did not answer with any configured credential");
            Err(e.into())
        }
    }
}
