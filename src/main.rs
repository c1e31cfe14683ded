use clap::Parser;
use std::path::PathBuf;
use tagsync::config::SyncConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tagsync")]
#[command(version, about = "Synchronizes container image version tags")]
struct Cli {
    /// Path to a JSON config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => SyncConfig::load(&path)?,
        None => SyncConfig::default(),
    };

    // failures are logged, never turned into a non-zero exit
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            if let Err(e) = tagsync::sync::run(&config).await {
                error!("Sync run aborted: {:#}", e);
            }
        });

    Ok(())
}
