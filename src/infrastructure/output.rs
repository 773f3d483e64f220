use crate::application::services::CommandSink;
use crate::domain::entities::CurlCommand;
use anyhow::{Result, anyhow};
use colored::Colorize;
use std::io::{self, Stdout, Write};
use std::sync::Mutex;

const BANNER: &str = "==================== CURL COMMAND ====================";
const RULE: &str = "======================================================";

/// Frames a command between delimiter lines, optionally highlighted
pub fn render_block(command: &CurlCommand, color: bool) -> String {
    let line = if color {
        command.as_str().bright_green().to_string()
    } else {
        command.to_string()
    };
    format!("\n{BANNER}\n{line}\n{RULE}\n\n")
}

/// Writes framed commands to a console-like stream
///
/// The whole block goes out under one lock so concurrent requests never
/// interleave their output.
pub struct ConsoleSink<W> {
    writer: Mutex<W>,
    color: bool,
}

impl ConsoleSink<Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(writer: W, color: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            color,
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|_| anyhow!("Output writer lock poisoned"))
    }
}

impl<W: Write + Send> CommandSink for ConsoleSink<W> {
    fn emit(&self, command: &CurlCommand) -> Result<()> {
        let block = render_block(command, self.color);
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow!("Output writer lock poisoned"))?;
        writer.write_all(block.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
