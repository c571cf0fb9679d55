//! PHP front end: tokens, declarations and AJAX hook registrations.

pub mod catalog;
pub mod declarations;
pub mod hooks;
pub mod lexer;

use anyhow::Result;
use ir::{FileIR, Token, TokenKind};
use std::time::Instant;
use tracing::debug;

pub use declarations::{collect_declarations, ClassSpan, Structure};
pub use hooks::{find_hook_registrations, HookScan};
pub use lexer::{tokenize, tokenize_with_deadline, LexIssue, LexTimeout, Lexed};


/// Indices of the tokens that carry code, i.e. everything but comments.
pub(crate) fn code_indices(tokens: &[Token]) -> Vec<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_trivia())
        .map(|(i, _)| i)
        .collect()
}

pub(crate) fn is_member_access(tok: &Token) -> bool {
    tok.kind == TokenKind::Punct && matches!(tok.text.as_str(), "->" | "?->" | "::")
}

/// Position in `code` of the bracket closing the one at position `open`.
/// All bracket kinds share one depth counter.
pub(crate) fn matching_close(tokens: &[Token], code: &[usize], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (p, &idx) in code.iter().enumerate().skip(open) {
        let t = &tokens[idx];
        if t.kind != TokenKind::Punct {
            continue;
        }
        match t.text.as_str() {
            "(" | "[" | "{" | "#[" => depth += 1,
            ")" | "]" | "}" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(p);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses PHP source into `fir`: tokens, declarations, hook registrations
/// and every diagnostic raised on the way.
///
/// # Example
/// ```
/// use ir::FileIR;
/// use parsers::parse_php;
/// let code = "<?php add_action('wp_ajax_save', 'save_cb'); function save_cb() {}";
/// let mut fir = FileIR::new("p.php".into(), "php".into(), String::new());
/// parse_php(code, &mut fir).unwrap();
/// assert_eq!(fir.hooks.len(), 1);
/// assert_eq!(fir.declarations[0].name, "save_cb");
/// ```
pub fn parse_php(content: &str, fir: &mut FileIR) -> Result<()> {
    parse_php_with_deadline(content, fir, None)
}

/// Same as [`parse_php`] but fails with [`LexTimeout`] once `deadline`
/// passes during tokenization.
pub fn parse_php_with_deadline(
    content: &str,
    fir: &mut FileIR,
    deadline: Option<Instant>,
) -> Result<()> {
    let lexed = match deadline {
        Some(deadline) => tokenize_with_deadline(content, deadline)?,
        None => tokenize(content),
    };
    fir.source = content.to_string();
    fir.tokens = lexed.tokens;
    fir.diagnostics.extend(
        lexed
            .issues
            .into_iter()
            .map(|issue| issue.into_diagnostic(&fir.file_path)),
    );

    let structure = collect_declarations(&fir.tokens, &fir.file_path);
    let scan = find_hook_registrations(&fir.tokens, &fir.source, &fir.file_path, &structure);
    debug!(
        file = %fir.file_path,
        tokens = fir.tokens.len(),
        declarations = structure.declarations.len(),
        hooks = scan.hooks.len(),
        "PHP file parsed"
    );
    fir.declarations = structure.declarations;
    fir.hooks = scan.hooks;
    fir.diagnostics.extend(scan.diagnostics);
    Ok(())
}
