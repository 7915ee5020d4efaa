use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

use search_client::config::load_config;
use search_client::observability::logging::init_logging;
use search_client::{ApiRequest, ClientError, SearchClient, TrafficClass};

#[derive(Parser)]
#[command(name = "search-cli")]
#[command(about = "Issue requests against the search service through the multi-host client", long_about = None)]
struct Cli {
    /// Path to the client configuration (TOML).
    #[arg(short, long, default_value = "search-client.toml")]
    config: PathBuf,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path (read hosts unless --write)
    Get {
        path: String,
        #[arg(long)]
        write: bool,
        /// Query parameters as key=value
        #[arg(short, long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
    /// POST a JSON body (write hosts unless --read)
    Post {
        path: String,
        #[arg(short, long)]
        data: String,
        #[arg(long)]
        read: bool,
    },
    /// PUT a JSON body to the write hosts
    Put {
        path: String,
        #[arg(short, long)]
        data: String,
    },
    /// DELETE a path on the write hosts
    Delete { path: String },
    /// Show read and write hosts with their health
    Hosts,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    init_logging(&config.observability);

    let client = match SearchClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &SearchClient, command: Commands) -> Result<(), ClientError> {
    let request = match command {
        Commands::Hosts => {
            print_hosts(client);
            return Ok(());
        }
        Commands::Get { path, write, query } => {
            let traffic = if write { TrafficClass::Write } else { TrafficClass::Read };
            query.into_iter().fold(
                ApiRequest::new(traffic, Method::GET, path),
                |request, (k, v)| request.with_query(k, v),
            )
        }
        Commands::Post { path, data, read } => {
            let traffic = if read { TrafficClass::Read } else { TrafficClass::Write };
            ApiRequest::new(traffic, Method::POST, path).with_body(parse_body(&data)?)
        }
        Commands::Put { path, data } => {
            ApiRequest::write(Method::PUT, path).with_body(parse_body(&data)?)
        }
        Commands::Delete { path } => ApiRequest::write(Method::DELETE, path),
    };

    let response = client.execute(request).await?;
    tracing::info!(
        host = %response.host,
        status = response.status,
        attempts = response.attempts,
        "Request completed"
    );
    let pretty = serde_json::to_string_pretty(&response.body)
        .map_err(|e| ClientError::MalformedResponse {
            host: response.host.clone(),
            message: e.to_string(),
        })?;
    println!("{}", pretty);
    Ok(())
}

fn parse_body(data: &str) -> Result<Value, ClientError> {
    serde_json::from_str(data).map_err(|e| ClientError::InvalidRequest(format!("--data is not JSON: {}", e)))
}

fn print_hosts(client: &SearchClient) {
    let expiration = client.retry_strategy().expiration_delay();
    println!("down expiration: {}s", expiration.as_secs());
    for traffic in [TrafficClass::Read, TrafficClass::Write] {
        println!("{} hosts:", traffic);
        for host in client.host_status(traffic) {
            println!(
                "  {:<48} {:<8} retries={}",
                host.url.as_str(),
                host.state.to_string(),
                host.retry_count
            );
        }
    }
}
