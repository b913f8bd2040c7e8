//! Output rendering for CLI surfaces.
//!
//! Every command builds one JSON envelope; `--format text` turns it into
//! plain lines instead.

use crate::core::error::MyappError;
use clap::ValueEnum;
use colored::Colorize;
use serde_json::Value as JsonValue;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Print `envelope` as JSON, or `lines` in text mode.
pub fn emit(format: OutputFormat, envelope: &JsonValue, lines: &[String]) -> Result<(), MyappError> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(envelope)?),
        OutputFormat::Text => {
            if lines.is_empty() {
                println!("{}", "(none)".dimmed());
            }
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// `  #<id>  <label>` row used by list commands.
pub fn row(id: impl std::fmt::Display, label: &str) -> String {
    format!("{} {}", format!("#{:<4}", id).bright_cyan(), label)
}
