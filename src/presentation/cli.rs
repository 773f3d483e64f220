use crate::application::builders::curl_builder::CurlCommandBuilder;
use crate::application::services::{CaptureService, CurlAddon, UpstreamClient};
use crate::domain::value_objects::Target;
use crate::infrastructure::capture_server::CaptureServer;
use crate::infrastructure::config::Config;
use crate::infrastructure::http_client::HyperUpstreamClient;
use crate::infrastructure::output::ConsoleSink;
use crate::infrastructure::record_reader::convert_records;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::{self, BufReader};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI configuration for curlcap
#[derive(Parser, Debug)]
#[command(name = "curlcap", version)]
#[command(about = "Print intercepted HTTP requests as ready-to-paste curl commands", long_about = None)]
pub struct Cli {
    /// Disable the green highlight around printed commands
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Escape single quotes in header values and the URL as well as the body
    #[arg(long, global = true)]
    pub strict_quoting: bool,

    /// Additional header to leave out of commands (repeatable)
    #[arg(long = "skip-header", value_name = "NAME", global = true)]
    pub skip_headers: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a reverse-mode capture server
    Listen {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        #[arg(short, long, default_value = "127.0.0.1")]
        bind: IpAddr,

        /// Forward captured requests to this http(s) origin
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Format JSON Lines request records from a file or stdin
    Convert {
        input: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        let config = Config::from_cli(self);
        let addon = Arc::new(CurlAddon::new(
            CurlCommandBuilder::new(config.format_options()),
            Box::new(ConsoleSink::stdout(config.color)),
        ));

        match &self.command {
            Command::Listen { port, bind, target } => {
                let target = target.as_deref().map(Target::new).transpose()?;
                let upstream: Option<Box<dyn UpstreamClient>> = match target {
                    Some(_) => Some(Box::new(HyperUpstreamClient::new()?)),
                    None => None,
                };

                let service = CaptureService::new(addon, upstream);
                let server = CaptureServer::bind(SocketAddr::new(*bind, *port), target, service).await?;

                tokio::select! {
                    result = server.serve() => result,
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutting down");
                        Ok(())
                    }
                }
            }
            Command::Convert { input } => {
                let summary = match input {
                    Some(path) => {
                        let file = File::open(path)
                            .with_context(|| format!("Failed to open {}", path.display()))?;
                        convert_records(BufReader::new(file), addon.as_ref())?
                    }
                    None => convert_records(io::stdin().lock(), addon.as_ref())?,
                };

                info!(
                    "Converted {} request(s), skipped {}",
                    summary.converted, summary.skipped
                );
                Ok(())
            }
        }
    }
}
