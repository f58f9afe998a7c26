//! `ob` — thin demonstration client for the gateway's HTTP control plane.
//!
//! Not a full command surface: the CLI itself is explicitly out of scope
//! (§1) beyond demonstrating the exit-code contract (§6.4) against a
//! handful of read-only/bucket-lifecycle commands.

mod client;
mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::CommandContext;
use config::Config;

#[derive(Parser)]
#[command(name = "ob")]
#[command(author = "Obstore Team")]
#[command(version)]
#[command(about = "Control-plane client for an obstore cluster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gateway endpoint, e.g. http://127.0.0.1:51080
    #[arg(long, global = true, env = "AIS_ENDPOINT")]
    endpoint: Option<String>,

    /// Bearer token
    #[arg(long, global = true, env = "AIS_TOKEN")]
    token: Option<String>,

    /// Emit JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List buckets, or list a bucket's objects
    Ls {
        bucket: Option<String>,
    },
    /// Show object headers without the body
    Head {
        bucket: String,
        key: String,
    },
    /// Stream an object's body to stdout
    Cat {
        bucket: String,
        key: String,
    },
    /// Delete an object
    Rm {
        bucket: String,
        key: String,
    },
    /// Create a bucket
    Mb {
        bucket: String,
    },
    /// Remove a bucket
    Rb {
        bucket: String,
    },
    /// Show this node's cluster/daemon info
    Info,
}

#[tokio::main]
async fn main() {
    // §6.4 maps unknown command/flag/arg to exit code 1, not clap's own
    // default of 2, so parse errors are handled here rather than via `parse()`.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print().ok();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry().with(fmt::layer().with_target(true)).with(filter).init();

    let config = Config::load(cli.endpoint.clone(), cli.token.clone());
    let ctx = CommandContext::new(&config, cli.json, cli.quiet);

    let result = run(&ctx, cli.command).await;

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            ctx.error(&format!("error: {e:#}"));
            1
        }
    };
    std::process::exit(code);
}

async fn run(ctx: &CommandContext, command: Commands) -> anyhow::Result<i32> {
    match command {
        Commands::Ls { bucket } => commands::ls::execute(ctx, bucket.as_deref()).await,
        Commands::Head { bucket, key } => commands::head::execute(ctx, &bucket, &key).await,
        Commands::Cat { bucket, key } => commands::cat::execute(ctx, &bucket, &key).await,
        Commands::Rm { bucket, key } => commands::rm::execute(ctx, &bucket, &key).await,
        Commands::Mb { bucket } => commands::mb::execute(ctx, &bucket).await,
        Commands::Rb { bucket } => commands::rb::execute(ctx, &bucket).await,
        Commands::Info => commands::info::execute(ctx).await,
    }
}
