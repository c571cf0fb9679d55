//! Entry point for the command-line interface.
//! Delegates to dedicated modules for argument handling,
//! scanning and output formatting.

use wp_ajax_audit::args::{parse_cli, Commands};
use wp_ajax_audit::scan::run_scan;
use wp_ajax_audit::tokens::run_tokens;

fn main() -> anyhow::Result<()> {
    let cli = parse_cli();
    match cli.command {
        Commands::Scan(args) => run_scan(args),
        Commands::Tokens(args) => run_tokens(args),
    }
}
