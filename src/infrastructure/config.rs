use crate::application::builders::curl_builder::{FormatOptions, QuotingPolicy};
use crate::presentation::cli::Cli;

/// Runtime settings for rendering and printing commands
#[derive(Debug, Clone)]
pub struct Config {
    pub color: bool,
    pub quoting: QuotingPolicy,
    pub extra_skipped_headers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color: true,
            quoting: QuotingPolicy::Compatible,
            extra_skipped_headers: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            color: !cli.no_color,
            quoting: if cli.strict_quoting {
                QuotingPolicy::Strict
            } else {
                QuotingPolicy::Compatible
            },
            extra_skipped_headers: cli.skip_headers.clone(),
        }
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            quoting: self.quoting,
            extra_skipped_headers: self.extra_skipped_headers.clone(),
        }
    }
}
