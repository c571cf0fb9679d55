//! CSV export, one row per hook.

use ir::Finding;
use std::io::{self, Write};

pub const CSV_HEADER: &str =
    "hook,file,line,callback,has_permission_check,has_nonce_check,severity";

/// Every field is quoted; embedded quotes are doubled.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub(crate) fn write_csv<W: Write>(out: &mut W, findings: &[Finding]) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for f in findings {
        let checks = f.security_checks();
        let row = [
            quote(&f.hook_name),
            quote(&f.file_path),
            quote(&f.line_number.to_string()),
            quote(&f.callback_function),
            quote(&checks.has_permission_check().to_string()),
            quote(&checks.has_nonce_check().to_string()),
            quote(f.severity().as_str()),
        ];
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}
