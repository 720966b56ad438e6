mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloudlaunch")]
#[command(about = "Launch virtual machines for cloud applications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an application config and show the launch settings it resolves to
    Validate {
        /// Application config file (JSON or YAML)
        config: PathBuf,
    },
    /// Run a complete launch against the in-memory provider
    DryRun {
        /// Application config file (JSON or YAML)
        config: PathBuf,
        /// Default image of the target cloud
        #[arg(short, long, env = "CLOUDLAUNCH_IMAGE")]
        image: String,
        /// Instance name
        #[arg(short, long, default_value = "cloudlaunch-dry-run")]
        name: String,
        /// Default instance type of the target cloud
        #[arg(long)]
        instance_type: Option<String>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries command output; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Validate { config } => {
            commands::validate::handle(&config)?;
        }
        Commands::DryRun {
            config,
            image,
            name,
            instance_type,
        } => {
            commands::dry_run::handle(&config, &image, &name, instance_type.as_deref()).await?;
        }
        Commands::Version => {
            println!("cloudlaunch {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
