use clap::Parser;
use colored::Colorize;
use curlcap::presentation::cli::Cli;
use env_logger::{Builder, Env};
use std::io::Write;

/// curlcap: turn intercepted requests into curl commands
///
/// Runs either as a reverse-mode capture server or as an offline converter
/// over recorded requests. Commands go to stdout, logs to stderr.
#[tokio::main]
async fn main() {
    initialize_logging();
    let cli = Cli::parse();

    if let Err(err) = cli.run().await {
        eprintln!("{} {:#}", "error:".red(), err);
        std::process::exit(1);
    }
}

fn initialize_logging() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let level = match record.level() {
                log::Level::Error => record.level().to_string().red(),
                log::Level::Warn => record.level().to_string().yellow(),
                log::Level::Info => record.level().to_string().green(),
                log::Level::Debug => record.level().to_string().cyan(),
                log::Level::Trace => record.level().to_string().magenta(),
            };
            writeln!(buf, "[{} {}] {}", level, record.target(), record.args())
        })
        .init();
}
