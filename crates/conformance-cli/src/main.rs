use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "conformance")]
#[command(about = "Connector conformance harness", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an admin command from a connector spec
    Render {
        #[command(subcommand)]
        action: RenderAction,
    },

    /// Run a conformance test against a provisioned external system
    Run {
        #[command(subcommand)]
        action: RunAction,
    },
}

#[derive(Subcommand)]
enum RenderAction {
    /// Render the `functions create` command
    Create {
        /// Path to the connector spec YAML file
        #[arg(short, long)]
        spec: String,

        /// Code file appended to the interpreted runtime base path
        #[arg(long)]
        code_file: Option<String>,

        /// Admin endpoint host override
        #[arg(long)]
        admin_host: Option<String>,

        /// Admin endpoint port override
        #[arg(long)]
        admin_port: Option<u16>,
    },

    /// Render the `functions update` command
    Update {
        /// Path to the connector spec YAML file
        #[arg(short, long)]
        spec: String,

        /// Code file appended to the interpreted runtime base path
        #[arg(long)]
        code_file: Option<String>,

        /// Admin endpoint host override
        #[arg(long)]
        admin_host: Option<String>,

        /// Admin endpoint port override
        #[arg(long)]
        admin_port: Option<u16>,
    },

    /// Render the `functions delete` command
    Delete {
        /// Path to the connector spec YAML file
        #[arg(short, long)]
        spec: String,
    },

    /// Render the `functions trigger` command
    Trigger {
        /// Path to the connector spec YAML file
        #[arg(short, long)]
        spec: String,

        /// Literal payload passed as the trigger value
        #[arg(long)]
        value: String,
    },
}

#[derive(Subcommand)]
enum RunAction {
    /// Validate the Kafka source adapter end to end (requires Docker)
    KafkaSource {
        /// Number of records to produce and verify
        #[arg(short, long, default_value = "10")]
        records: usize,

        /// Cluster identifier used when naming provisioned resources
        #[arg(short, long, default_value = "local")]
        cluster: String,

        /// Verification timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Tolerate duplicate deliveries of expected records
        #[arg(long)]
        allow_duplicates: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Render { action } => match action {
            RenderAction::Create {
                spec,
                code_file,
                admin_host,
                admin_port,
            } => {
                commands::render::create(&spec, code_file.as_deref(), admin_host, admin_port)?;
            }
            RenderAction::Update {
                spec,
                code_file,
                admin_host,
                admin_port,
            } => {
                commands::render::update(&spec, code_file.as_deref(), admin_host, admin_port)?;
            }
            RenderAction::Delete { spec } => {
                commands::render::delete(&spec)?;
            }
            RenderAction::Trigger { spec, value } => {
                commands::render::trigger(&spec, &value)?;
            }
        },
        Commands::Run { action } => match action {
            RunAction::KafkaSource {
                records,
                cluster,
                timeout,
                allow_duplicates,
                format,
            } => {
                commands::run::kafka_source(
                    records,
                    &cluster,
                    timeout,
                    allow_duplicates,
                    commands::run::OutputFormat::from(format.as_str()),
                )
                .await?;
            }
        },
    }

    Ok(())
}
