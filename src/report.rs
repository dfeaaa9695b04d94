//! Output helpers shared by the commands.
//!
//! Every command can print a table, JSON or YAML, and optionally persist the
//! same payload to a file.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(Error::InvalidArgument(format!(
                "Unsupported format '{}'. Use table|json|yaml",
                other
            ))),
        }
    }
}

/// Render `value` in the requested format; `table` builds the text layout.
pub fn render<T, F>(value: &T, fmt: OutputFormat, table: F) -> Result<String>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match fmt {
        OutputFormat::Table => Ok(table(value)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
    }
}

/// Print the rendered payload and persist it when `output` is set.
pub fn emit<T, F>(value: &T, fmt: OutputFormat, output: Option<&Path>, table: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    let payload = render(value, fmt, table)?;
    println!("{payload}");

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, &payload)?;
        println!("Saved: {}", path.display());
    }
    Ok(())
}

/// One-line text chart of a series, scaled between its min and max.
pub fn sparkline(values: &[f64]) -> String {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (Some(min), Some(max)) = (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) else {
        return String::new();
    };

    let span = max - min;
    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                return ' ';
            }
            if span == 0.0 {
                return SPARK_BARS[SPARK_BARS.len() / 2];
            }
            let idx = ((v - min) / span * (SPARK_BARS.len() - 1) as f64).round() as usize;
            SPARK_BARS[idx.min(SPARK_BARS.len() - 1)]
        })
        .collect()
}

/// `0.159` -> `+15.90%`; `-` when absent.
pub fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:+.2}%", v * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate to `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
