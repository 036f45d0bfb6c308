use clap::{Parser, Subcommand};
use ethpulse_core::config::AppConfig;

mod commands;
use commands::{
    data, handle_config_command, translate,
    utils::{print_error, CliError},
    ConfigCommands,
};

#[derive(Parser)]
#[command(name = "ethpulse-cli")]
#[command(about = "ethpulse CLI - inspect the transaction store and manage configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file read by data and translate commands
    #[arg(long, env = "ETHPULSE_CONFIG", default_value = "config/config.toml", global = true)]
    config: String,

    /// Overrides `store.database_url`
    #[arg(long, env = "ETHPULSE_DATABASE_URL", global = true)]
    database: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate statistics over stored transactions
    Stats,

    /// Most recently ingested transactions
    Recent {
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Transactions sent or received by an address
    Address {
        address: String,

        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Run a read-only SELECT against the store
    Query {
        sql: String,

        /// Positional parameters as a JSON array, e.g. '["0xabc", 10]'
        #[arg(short, long)]
        params: Option<String>,
    },

    /// Translate a natural-language question to SQL
    Translate {
        text: String,

        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        model: Option<String>,

        /// Credential for `--provider`; ignored when no provider is given
        #[arg(long, env = "ETHPULSE_LLM_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn load_config(path: &str) -> Result<AppConfig, CliError> {
    AppConfig::from_file(path).map_err(|e| CliError::Config(e.to_string()))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config(config_command) => handle_config_command(config_command).await,

        Commands::Translate { text, provider, model, api_key } => {
            let config = load_config(&cli.config)?;
            translate::translate(
                &config,
                &text,
                provider.as_deref(),
                model.as_deref(),
                api_key.as_deref(),
            )
            .await
        }

        Commands::Stats => {
            let config = load_config(&cli.config)?;
            let store = data::open_store(&config, cli.database.as_deref()).await?;
            data::show_stats(store.as_ref()).await
        }

        Commands::Recent { limit } => {
            let config = load_config(&cli.config)?;
            let store = data::open_store(&config, cli.database.as_deref()).await?;
            data::show_recent(store.as_ref(), config.clamp_limit(limit)).await
        }

        Commands::Address { address, limit } => {
            let config = load_config(&cli.config)?;
            let store = data::open_store(&config, cli.database.as_deref()).await?;
            data::show_by_address(store.as_ref(), &address, config.clamp_limit(limit)).await
        }

        Commands::Query { sql, params } => {
            let params: Vec<serde_json::Value> = match params {
                Some(raw) => serde_json::from_str(&raw)
                    .map_err(|e| CliError::Config(format!("--params must be a JSON array: {e}")))?,
                None => Vec::new(),
            };
            let config = load_config(&cli.config)?;
            let store = data::open_store(&config, cli.database.as_deref()).await?;
            data::run_query(store, &sql, &params).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
