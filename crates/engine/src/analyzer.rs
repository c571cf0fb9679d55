//! Finds the WordPress security primitives a callback body calls.

use ir::{AnalysisMode, SecurityChecks, Token, TokenKind, TokenRange};
use parsers::catalog::Catalog;

/// Tokens that turn a following `name(` into something other than a plain
/// function call: method calls, static calls, declarations, instantiation.
fn blocks_call(prev: &Token) -> bool {
    match prev.kind {
        TokenKind::Punct => matches!(prev.text.as_str(), "->" | "?->" | "::"),
        TokenKind::Keyword => ["function", "fn", "new"]
            .iter()
            .any(|kw| prev.text.eq_ignore_ascii_case(kw)),
        _ => false,
    }
}

fn is_member_access(prev: &Token) -> bool {
    prev.kind == TokenKind::Punct && matches!(prev.text.as_str(), "->" | "?->" | "::")
}

/// What a code token inside the body does.
enum Step<'t> {
    /// Plain call of the named function.
    Call(&'t str),
    /// `->name(` or `::name(`.
    MethodCall(&'t str),
    /// `echo`, `print` and friends.
    Statement(&'t str),
    Other,
}

/// Code tokens of `body` (comments dropped), classified in source order.
fn steps<'t>(tokens: &'t [Token], body: TokenRange) -> impl Iterator<Item = Step<'t>> + 't {
    let end = body.end.min(tokens.len());
    let start = body.start.min(end);
    let code: Vec<&'t Token> = tokens[start..end].iter().filter(|t| !t.is_trivia()).collect();
    (0..code.len()).map(move |i| {
        let tok = code[i];
        let prev = i.checked_sub(1).map(|p| code[p]);
        let opens_call = code.get(i + 1).is_some_and(|n| n.is_punct("("));
        match tok.kind {
            TokenKind::Identifier if opens_call => match prev {
                Some(p) if is_member_access(p) => Step::MethodCall(tok.name()),
                Some(p) if blocks_call(p) => Step::Other,
                _ => Step::Call(tok.name()),
            },
            TokenKind::Keyword => Step::Statement(tok.text.as_str()),
            _ => Step::Other,
        }
    })
}

/// Which primitives the body calls.
///
/// In [`AnalysisMode::Baseline`] every call counts wherever it appears,
/// including inside conditionals and nested closures. In
/// [`AnalysisMode::Ordered`] a call counts only when it starts before the
/// first sensitive effect of the body.
///
/// # Example
/// ```
/// use engine::analyze;
/// use ir::{AnalysisMode, FileIR, TokenRange};
/// use parsers::catalog::Catalog;
///
/// let mut fir = FileIR::new("a.php".into(), "php".into(), String::new());
/// parsers::parse_php("<?php update_option('a', 1); current_user_can('x');", &mut fir).unwrap();
/// let all = TokenRange::new(0, fir.tokens.len());
/// let catalog = Catalog::php();
/// assert!(analyze(&fir.tokens, all, AnalysisMode::Baseline, &catalog).current_user_can);
/// assert!(!analyze(&fir.tokens, all, AnalysisMode::Ordered, &catalog).current_user_can);
/// ```
pub fn analyze(
    tokens: &[Token],
    body: TokenRange,
    mode: AnalysisMode,
    catalog: &Catalog,
) -> SecurityChecks {
    let mut checks = SecurityChecks::default();
    for step in steps(tokens, body) {
        if mode == AnalysisMode::Ordered && is_sensitive(&step, catalog) {
            break;
        }
        if let Step::Call(name) = step {
            if catalog.is_security_check(name) {
                checks.record(name);
            }
        }
    }
    checks
}

fn is_sensitive(step: &Step<'_>, catalog: &Catalog) -> bool {
    match step {
        Step::Call(name) => catalog.is_sensitive_function(name),
        Step::MethodCall(name) => catalog.is_sensitive_method(name),
        Step::Statement(kw) => catalog.is_sensitive_keyword(kw),
        Step::Other => false,
    }
}

