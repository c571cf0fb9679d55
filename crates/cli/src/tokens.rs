//! `tokens` subcommand: dumps what the front end sees in one file.

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::fs;
use std::io::{self, Write};

use crate::args::TokensArgs;

pub fn run_tokens(args: TokensArgs) -> Result<()> {
    if parsers::detect_type(&args.file).is_none() {
        bail!("{} is not a PHP file", args.file.display());
    }
    let bytes =
        fs::read(&args.file).with_context(|| format!("failed to read {}", args.file.display()))?;
    let fir = parsers::parse_source(&args.file.to_string_lossy(), &bytes, None)?;
    let dump = if args.full {
        json!({
            "file": fir.file_path,
            "tokens": fir.tokens,
            "hooks": fir.hooks,
            "declarations": fir.declarations,
            "diagnostics": fir.diagnostics,
        })
    } else {
        json!({
            "file": fir.file_path,
            "tokens": fir.tokens,
            "diagnostics": fir.diagnostics,
        })
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &dump)?;
    writeln!(out)?;
    Ok(())
}
