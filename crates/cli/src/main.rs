use std::{path::Path, process};

use billing_sdk::{BillingConfig, BillingProvider};
use clap::{Parser, Subcommand};

mod checkouts;
mod events;
mod output;
mod watch;
mod webhooks;

use output::OutputFormat;

pub struct Context {
    pub provider: BillingProvider,
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "billing.io - crypto checkout API CLI", long_about = None)]
struct Opts {
    /// Secret API key (sk_live_... or sk_test_...)
    #[arg(long = "api-key", short = 'k', global = true, env = "BILLING_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Override the API base URL (default: https://api.billing.io/v1)
    #[arg(long = "base-url", global = true, env = "BILLING_BASE_URL")]
    base_url: Option<String>,

    /// Output format: json or pretty
    #[arg(long = "format", short = 'f', global = true, default_value = "pretty")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Poll a checkout until its payment settles
    Watch(watch::WatchCommand),
    /// Fetch the current status of a checkout once
    Status(watch::StatusCommand),
    /// Checkout commands
    Checkouts {
        #[clap(subcommand)]
        command: CheckoutsCommand,
    },
    /// Webhook endpoint commands
    Webhooks {
        #[clap(subcommand)]
        command: WebhooksCommand,
    },
    /// Event log commands
    Events {
        #[clap(subcommand)]
        command: EventsCommand,
    },
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum CheckoutsCommand {
    /// List checkouts
    List(checkouts::ListCommand),
    /// Create a checkout
    Create(checkouts::CreateCommand),
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum WebhooksCommand {
    /// List webhook endpoints
    List(webhooks::ListCommand),
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
pub enum EventsCommand {
    /// List events
    List(events::ListCommand),
}

#[tokio::main]
async fn main() {
    load_env_file(Path::new("."));

    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            process::exit(e.exit_code());
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let provider = match build_provider(&opts) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let ctx = Context {
        provider,
        format: opts.format.clone(),
    };

    if let Err(e) = handle_command(opts.command, &ctx).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Load environment variables from a .env file in the given directory
fn load_env_file(dir: &Path) {
    let env_file_path = dir.join(".env");

    match dotenvy::from_path(&env_file_path) {
        Ok(_) => {
            eprintln!("✓ Loaded environment from {}", env_file_path.display());
        }
        Err(e) if e.not_found() => {}
        Err(e) => {
            eprintln!(
                "Warning: Failed to load .env file at {}: {}",
                env_file_path.display(),
                e
            );
        }
    }
}

fn build_provider(opts: &Opts) -> Result<BillingProvider, String> {
    let api_key = opts.api_key.as_ref().ok_or_else(|| {
        "API key not found. Please provide --api-key or set the BILLING_API_KEY environment variable"
            .to_string()
    })?;

    let mut config = BillingConfig::new(api_key);
    if let Some(ref base_url) = opts.base_url {
        config = config.with_base_url(base_url);
    }

    BillingProvider::new(config).map_err(|e| e.to_string())
}

async fn handle_command(command: Command, ctx: &Context) -> Result<(), String> {
    match command {
        Command::Watch(cmd) => cmd.execute(ctx).await,
        Command::Status(cmd) => cmd.execute(ctx).await,
        Command::Checkouts { command } => match command {
            CheckoutsCommand::List(cmd) => cmd.execute(ctx).await,
            CheckoutsCommand::Create(cmd) => cmd.execute(ctx).await,
        },
        Command::Webhooks { command } => match command {
            WebhooksCommand::List(cmd) => cmd.execute(ctx).await,
        },
        Command::Events { command } => match command {
            EventsCommand::List(cmd) => cmd.execute(ctx).await,
        },
    }
}
