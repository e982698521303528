use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use graphql_rpc_client::capability::{CallLogging, RequestIdCapability};
use graphql_rpc_client::config::loader::load_config;
use graphql_rpc_client::config::{ClientConfig, ModeKind};
use graphql_rpc_client::observability::logging::init_logging;
use graphql_rpc_client::{Client, ClientBuilder, Operation, SyncMode};

#[derive(Parser)]
#[command(name = "gql-cli")]
#[command(about = "Send a single GraphQL operation and print the result", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint; operations are posted to {endpoint}/graphql
    #[arg(short, long)]
    endpoint: Option<String>,

    #[arg(long)]
    read_timeout_ms: Option<u64>,

    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query
    Query {
        /// Root field name
        name: String,
        /// Argument text, e.g. 'id: 42'
        #[arg(long)]
        args: Option<String>,
        /// Selection set, e.g. 'id title'
        #[arg(long)]
        select: Option<String>,
    },
    /// Run a mutation
    Mutation {
        name: String,
        #[arg(long)]
        args: Option<String>,
        #[arg(long)]
        select: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    // The CLI always blocks on the single call
    config.mode = ModeKind::Sync;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    init_logging(&config.observability);

    let mut builder = ClientBuilder::<SyncMode>::from_config(config)?
        .add_capability(RequestIdCapability)
        .add_capability(CallLogging);
    if let Some(ms) = cli.read_timeout_ms {
        builder = builder.read_timeout(ms)?;
    }
    if let Some(ms) = cli.connect_timeout_ms {
        builder = builder.connect_timeout(ms)?;
    }
    let client: Client<SyncMode> = builder.build()?;

    let operation = match cli.command {
        Commands::Query { name, args, select } => with_parts(Operation::query(name), args, select),
        Commands::Mutation { name, args, select } => with_parts(Operation::mutation(name), args, select),
    };
    tracing::debug!(document = %operation.document(), "Sending operation");

    match client.execute::<Value>(&operation) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("Caused by: {}", cause);
                source = cause.source();
            }
            std::process::exit(1);
        }
    }
}

fn with_parts(operation: Operation, args: Option<String>, select: Option<String>) -> Operation {
    let operation = match args {
        Some(args) => operation.arguments(args),
        None => operation,
    };
    match select {
        Some(select) => operation.selection(select),
        None => operation,
    }
}
