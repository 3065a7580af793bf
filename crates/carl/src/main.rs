use anyhow::Result;
use carl::config::CarlConfig;
use clap::Parser;
use std::path::PathBuf;

/// Package repository resolver and download relay
#[derive(Debug, Parser)]
#[command(name = "carl", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Public origin used in rewritten file URLs (overrides the config file)
    #[arg(long)]
    public_url: Option<String>,

    /// Enable debug logging when RUST_LOG is unset
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<CarlConfig> {
        let mut config = match &self.config {
            Some(path) => CarlConfig::load(path)?,
            None => CarlConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(public_url) = self.public_url {
            config.public_url = Some(public_url);
        }

        if let Err(errors) = config.validate() {
            anyhow::bail!("Invalid configuration:\n  {}", errors.join("\n  "));
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    carl::logging::init(cli.verbose)?;

    if let Some(path) = &cli.config {
        tracing::info!("Using config file {}", path.display());
    }
    let config = cli.into_config()?;

    carl::server::start_server(config).await
}
