//! Rendering of pipeline results.


use anyhow::{Context, Result};
use clap::ValueEnum;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::narrative::PipelineResult;

/// Output format for narratives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One header per file followed by its narrative.
    Text,
    /// The serialized result, including prompts when recorded.
    Yaml,
}

/// Writes `result` in the requested format.
pub fn write_result<W: WriteColor>(
    out: &mut W,
    result: &PipelineResult,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for narrative in &result.narratives {
                write_header(out, &narrative.path)?;
                writeln!(out, "{}\n", narrative.text)?;
            }
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(result).context("Failed to serialize result")?;
            write!(out, "{yaml}")?;
        }
    }
    Ok(())
}

/// Writes the prompt trace, numbered from 1.
pub fn write_prompts<W: WriteColor>(out: &mut W, prompts: &[String]) -> Result<()> {
    for (i, prompt) in prompts.iter().enumerate() {
        write_header(out, &format!("prompt {}", i + 1))?;
        writeln!(out, "{prompt}\n")?;
    }
    Ok(())
}

fn write_header<W: WriteColor>(out: &mut W, title: &str) -> Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(out, "== {title} ==")?;
    out.reset()?;
    writeln!(out)?;
    Ok(())
}
