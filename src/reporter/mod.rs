mod json;
mod markdown;
mod text;

pub use json::*;
pub use markdown::*;
pub use text::*;

use crate::error::Result;
use crate::types::ScheduleResult;
use std::fs;
use std::path::Path;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}

/// Generate all requested reports and write them to the output directory
pub fn generate_reports(
    result: &ScheduleResult,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    for format in formats {
        match format {
            OutputFormat::Json => {
                let json = generate_json_report(result)?;
                fs::write(output_dir.join("schedule.json"), json)?;
            }
            OutputFormat::Markdown => {
                let md = generate_markdown_report(result);
                fs::write(output_dir.join("schedule.md"), md)?;
            }
            OutputFormat::Text => {
                let txt = generate_text_report(result);
                fs::write(output_dir.join("schedule.txt"), txt)?;
            }
        }
    }

    Ok(())
}
