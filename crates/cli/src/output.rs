use anyhow::Context;
use clap::ValueEnum;
use ir::ScanResult;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;

/// Supported output formats for scan results.
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Sarif,
    Csv,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<reporters::Format>().map(|f| match f {
            reporters::Format::Text => Format::Text,
            reporters::Format::Json => Format::Json,
            reporters::Format::Sarif => Format::Sarif,
            reporters::Format::Csv => Format::Csv,
        })
    }
}

impl From<Format> for reporters::Format {
    fn from(fmt: Format) -> Self {
        match fmt {
            Format::Text => reporters::Format::Text,
            Format::Json => reporters::Format::Json,
            Format::Sarif => reporters::Format::Sarif,
            Format::Csv => reporters::Format::Csv,
        }
    }
}

/// Writes the report to `path`, or to stdout when no path is given.
/// Colors are only used for a terminal stdout.
pub fn write_report(
    result: &ScanResult,
    fmt: Format,
    path: Option<&Path>,
    no_color: bool,
) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            reporters::write_result(&mut out, result, fmt.into(), false)?;
            out.flush()?;
        }
        None => {
            let color = !no_color && io::stdout().is_terminal();
            reporters::print_result(result, fmt.into(), color)?;
        }
    }
    Ok(())
}
