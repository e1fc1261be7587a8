//! bucketgate command-line client.
//!
//! Sends one rate-limited API call through the dispatcher and prints the
//! decoded body.
//!
//! ```text
//! bucketgate [--config FILE] request GET /channels/{channel_id}/messages --param channel_id=123
//! bucketgate me
//! bucketgate members --guild-id 42 --query jo --limit 5
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;

use bucketgate::config::loader::apply_env_overrides;
use bucketgate::config::validation::validate_config;
use bucketgate::config::{load_config, ConfigError};
use bucketgate::observability::{logging, metrics};
use bucketgate::{Dispatcher, DispatcherConfig, FilePayload, RequestOptions, ResponseBody, Route};

#[derive(Parser)]
#[command(name = "bucketgate")]
#[command(about = "Rate-limited REST API client", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an arbitrary request
    Request {
        #[arg(value_parser = parse_method)]
        method: Method,
        /// Path template, e.g. /channels/{channel_id}/messages
        path: String,
        /// Template parameter as key=value
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// JSON request body
        #[arg(long)]
        json: Option<String>,
        /// Audit log reason
        #[arg(long)]
        reason: Option<String>,
        /// File to upload (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    /// Show the current user
    Me,
    /// Search guild members
    Members {
        #[arg(long)]
        guild_id: u64,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 1)]
        limit: u32,
    },
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{}`", s))
}

fn resolve_config(path: Option<&PathBuf>) -> Result<DispatcherConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = DispatcherConfig::default();
            apply_env_overrides(&mut config);
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::debug!(client = ?config.client, "Configuration loaded");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    match run(cli.command, &config).await {
        Ok(body) => {
            print_body(&body);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &DispatcherConfig) -> Result<ResponseBody, Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::from_config(config)?;

    let body = match command {
        Commands::Request {
            method,
            path,
            params,
            json,
            reason,
            files,
        } => {
            let route = Route::new(method, &path, params)?;
            let mut options = RequestOptions::new();
            if let Some(json) = json {
                options = options.json(serde_json::from_str::<Value>(&json)?);
            }
            if let Some(reason) = reason {
                options = options.reason(reason);
            }
            for file in files {
                options = options.file(FilePayload::open(&file)?);
            }
            dispatcher.request(&route, options).await?
        }
        Commands::Me => dispatcher.get_current_user().await?,
        Commands::Members {
            guild_id,
            query,
            limit,
        } => dispatcher.request_guild_members(guild_id, &query, limit).await?,
    };

    Ok(body)
}

fn print_body(body: &ResponseBody) {
    match body {
        ResponseBody::Json(value) => match serde_json::to_string_pretty(value) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", value),
        },
        ResponseBody::Text(text) => println!("{}", text),
    }
}
