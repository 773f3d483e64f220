use crate::application::services::RequestHandler;
use crate::domain::entities::CapturedRequest;
use anyhow::{Context, Result};
use log::warn;
use std::io::BufRead;

/// Outcome of a conversion run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub converted: usize,
    pub skipped: usize,
}

/// Feeds JSON Lines request records to a handler
///
/// Blank lines are ignored and malformed records are skipped with a warning.
/// Only a failure to read the input itself is an error.
pub fn convert_records<R: BufRead>(reader: R, handler: &dyn RequestHandler) -> Result<ConvertSummary> {
    let mut summary = ConvertSummary::default();

    for (index, line) in reader.split(b'\n').enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", number))?;

        let parsed = std::str::from_utf8(&line)
            .map_err(|err| format!("not valid UTF-8 ({})", err))
            .and_then(|text| {
                if text.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str::<CapturedRequest>(text)
                    .map(Some)
                    .map_err(|err| err.to_string())
            });

        match parsed {
            Ok(None) => {}
            Ok(Some(request)) => {
                handler.on_request(&request);
                summary.converted += 1;
            }
            Err(reason) => {
                warn!("Skipping line {}: {}", number, reason);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}
