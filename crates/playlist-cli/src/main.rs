mod output;
mod summary;

use anyhow::{bail, Context};
use clap::Parser;
use playlist_core::{Config, HttpTransport, Orchestrator, WarnLevel};
use std::path::PathBuf;
use tracing::{error, warn};

#[derive(Parser)]
#[command(
    name = "playlist-publish",
    about = "Publish a playlist with one media file, one screen and one URL item",
    version
)]
struct Cli {
    /// Media file to upload (default: sample.jpg)
    media: Option<PathBuf>,

    /// YAML config file; flags and environment override it
    #[arg(long, env = "DEMO_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "DEMO_TENANT")]
    tenant: Option<String>,

    #[arg(long, env = "DEMO_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "DEMO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "DEMO_CLIENT_ID")]
    client_id: Option<String>,

    /// Identity service base URL
    #[arg(long, env = "DEMO_AUTH_BASE")]
    auth_base: Option<String>,

    /// Content API base URL
    #[arg(long, env = "DEMO_API_BASE")]
    api_base: Option<String>,

    /// Reporting service base URL
    #[arg(long, env = "DEMO_POP_BASE")]
    pop_base: Option<String>,

    /// Name of the playlist to (re)create
    #[arg(long, env = "DEMO_PLAYLIST")]
    playlist: Option<String>,

    /// Seconds to wait after publishing before reading the overview
    #[arg(long, env = "DEMO_POLL_DELAY")]
    poll_delay: Option<u64>,

    /// Accept invalid TLS certificates (local development only)
    #[arg(long, env = "DEMO_INSECURE")]
    insecure: bool,

    /// Output as JSON
    #[arg(long, short = 'j')]
    json: bool,
}

impl Cli {
    /// Config file values with every given flag laid over them.
    fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("failed to load config")?;

        let credential = &mut config.credential;
        overlay(&mut credential.tenant, &self.tenant);
        overlay(&mut credential.username, &self.username);
        overlay(&mut credential.password, &self.password);
        overlay(&mut credential.client_id, &self.client_id);

        let endpoints = &mut config.endpoints;
        overlay(&mut endpoints.auth_base, &self.auth_base);
        overlay(&mut endpoints.api_base, &self.api_base);
        overlay(&mut endpoints.pop_base, &self.pop_base);

        overlay(&mut config.playlist.name, &self.playlist);
        overlay(&mut config.media_path, &self.media);
        overlay(&mut config.poll_delay_secs, &self.poll_delay);
        config.accept_invalid_certs |= self.insecure;
        Ok(config)
    }
}

fn overlay<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config = cli.resolve_config()?;

    let mut invalid = 0;
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => warn!("{}", w.message),
            WarnLevel::Error => {
                error!("{}", w.message);
                invalid += 1;
            }
        }
    }
    if invalid > 0 {
        bail!("configuration has {invalid} error(s)");
    }

    let transport = HttpTransport::from_config(&config).context("failed to build HTTP client")?;
    let outcome = Orchestrator::new(&transport, &config).run();

    if cli.json {
        output::print_json(&summary::to_json(&outcome))?;
    } else {
        summary::print(&outcome);
    }
    Ok(outcome.exit_status().code())
}
