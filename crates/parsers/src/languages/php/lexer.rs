//! Hand-written PHP tokenizer.
//!
//! Produces a lossless token stream: every token's text is the exact slice
//! of the source at its offset, tokens never overlap, and the only bytes
//! not covered by a token are ASCII whitespace between PHP tokens.
//! Malformed input never fails; it yields diagnostics instead.

use ir::{Diagnostic, DiagnosticKind, Token, TokenKind};
use std::fmt;
use std::time::Instant;

/// The clock is only consulted once per this many tokens.
const DEADLINE_CHECK_INTERVAL: usize = 1024;

const KEYWORDS: &[&str] = &[
    "abstract", "and", "array", "as", "break", "callable", "case", "catch", "class", "clone",
    "const", "continue", "declare", "default", "die", "do", "echo", "else", "elseif", "empty",
    "enddeclare", "endfor", "endforeach", "endif", "endswitch", "endwhile", "eval", "exit",
    "extends", "final", "finally", "fn", "for", "foreach", "function", "global", "goto", "if",
    "implements", "include", "include_once", "instanceof", "insteadof", "interface", "isset",
    "list", "match", "namespace", "new", "or", "print", "private", "protected", "public",
    "readonly", "require", "require_once", "return", "static", "switch", "throw", "trait", "try",
    "unset", "use", "var", "while", "xor", "yield",
];

/// Longest operators first so that prefix matching picks the longest one.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "**=", "...", "<=>", "===", "!==", "??=", "?->", "::", "->", "=>", "==", "!=",
    "<>", "<=", ">=", "&&", "||", "??", "++", "--", "+=", "-=", "*=", "/=", ".=", "%=", "&=",
    "|=", "^=", "<<", ">>", "**", "#[",
];

const SINGLE_PUNCT: &[u8] = b"()[]{};,.+-*/%=<>!?:&|^~@$\\";

/// A problem found while tokenizing, not yet attached to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexIssue {
    pub kind: DiagnosticKind,
    pub line: usize,
    pub message: String,
}

impl LexIssue {
    pub fn into_diagnostic(self, file: &str) -> Diagnostic {
        Diagnostic::new(self.kind, file, self.message).at_line(self.line)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub issues: Vec<LexIssue>,
}

/// The per-file time budget ran out before tokenizing finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexTimeout {
    pub tokens_emitted: usize,
}

impl fmt::Display for LexTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tokenizer deadline exceeded after {} tokens",
            self.tokens_emitted
        )
    }
}

impl std::error::Error for LexTimeout {}

/// Tokenizes a whole file.
///
/// # Example
/// ```
/// use parsers::php::lexer::tokenize;
/// use ir::TokenKind;
/// let lexed = tokenize("<html><?php echo 'hi'; ?>");
/// let kinds: Vec<_> = lexed.tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(kinds[0], TokenKind::InlineHtml);
/// assert_eq!(kinds[1], TokenKind::OpenTag);
/// assert!(lexed.issues.is_empty());
/// ```
pub fn tokenize(source: &str) -> Lexed {
    let mut lexer = Lexer::new(source);
    // Without a deadline the loop cannot time out.
    let _ = lexer.run(None);
    lexer.finish()
}

/// Like [`tokenize`], but gives up once `deadline` has passed.
pub fn tokenize_with_deadline(source: &str, deadline: Instant) -> Result<Lexed, LexTimeout> {
    let mut lexer = Lexer::new(source);
    lexer.run(Some(deadline))?;
    Ok(lexer.finish())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Html,
    Php,
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    line_start: usize,
    mode: Mode,
    tokens: Vec<Token>,
    issues: Vec<LexIssue>,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            line_start: 0,
            mode: Mode::Html,
            tokens: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn finish(self) -> Lexed {
        Lexed {
            tokens: self.tokens,
            issues: self.issues,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.bytes[self.pos..].starts_with(s.as_bytes())
    }

    /// Moves the cursor to `to`, keeping line bookkeeping in sync.
    fn advance_to(&mut self, to: usize) {
        for (i, b) in self.bytes[self.pos..to].iter().enumerate() {
            if *b == b'\n' {
                self.line += 1;
                self.line_start = self.pos + i + 1;
            }
        }
        self.pos = to;
    }

    fn emit(&mut self, kind: TokenKind, end: usize) {
        let token = Token {
            kind,
            text: self.src[self.pos..end].to_string(),
            offset: self.pos,
            line: self.line,
            column: self.pos - self.line_start + 1,
        };
        self.tokens.push(token);
        self.advance_to(end);
    }

    fn issue(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.issues.push(LexIssue {
            kind,
            line: self.line,
            message: message.into(),
        });
    }

    /// Emits the rest of the input as one token and stops.
    fn unterminated(&mut self, kind: TokenKind, diag: DiagnosticKind, what: &str) {
        self.issue(diag, format!("unterminated {what} runs to end of file"));
        self.emit(kind, self.bytes.len());
    }

    fn run(&mut self, deadline: Option<Instant>) -> Result<(), LexTimeout> {
        let mut next_check = DEADLINE_CHECK_INTERVAL;
        while self.pos < self.bytes.len() {
            if let Some(deadline) = deadline {
                if self.tokens.len() >= next_check {
                    next_check = self.tokens.len() + DEADLINE_CHECK_INTERVAL;
                    if Instant::now() >= deadline {
                        return Err(LexTimeout {
                            tokens_emitted: self.tokens.len(),
                        });
                    }
                }
            }
            match self.mode {
                Mode::Html => self.lex_html(),
                Mode::Php => self.lex_php(),
            }
        }
        Ok(())
    }

    fn lex_html(&mut self) {
        let rest = &self.src[self.pos..];
        match rest.find("<?") {
            Some(0) => {
                let len = if rest.len() >= 5 && rest.as_bytes()[..5].eq_ignore_ascii_case(b"<?php") {
                    5
                } else if rest.starts_with("<?=") {
                    3
                } else {
                    2
                };
                self.emit(TokenKind::OpenTag, self.pos + len);
                self.mode = Mode::Php;
            }
            Some(idx) => self.emit(TokenKind::InlineHtml, self.pos + idx),
            None => self.emit(TokenKind::InlineHtml, self.bytes.len()),
        }
    }

    fn lex_php(&mut self) {
        let Some(b) = self.peek(0) else {
            return;
        };
        if b.is_ascii_whitespace() {
            let mut end = self.pos;
            while end < self.bytes.len() && self.bytes[end].is_ascii_whitespace() {
                end += 1;
            }
            self.advance_to(end);
            return;
        }
        if self.starts_with("?>") {
            self.emit(TokenKind::CloseTag, self.pos + 2);
            self.mode = Mode::Html;
            return;
        }
        if b == b'<' && self.starts_with("<<<") && self.lex_heredoc() {
            return;
        }
        match b {
            b'#' if self.peek(1) != Some(b'[') => self.lex_line_comment(),
            b'/' if self.peek(1) == Some(b'/') => self.lex_line_comment(),
            b'/' if self.peek(1) == Some(b'*') => self.lex_block_comment(),
            b'\'' | b'"' | b'`' => self.lex_quoted(),
            b'$' if self.peek(1).is_some_and(is_ident_start) => {
                let end = self.scan_ident(self.pos + 1);
                self.emit(TokenKind::Variable, end);
            }
            b'\\' if self.peek(1).is_some_and(is_ident_start) => self.lex_name(),
            b if is_ident_start(b) => self.lex_name(),
            b if b.is_ascii_digit() => self.lex_number(),
            b'.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
            _ => self.lex_punct(),
        }
    }

    fn lex_line_comment(&mut self) {
        let mut end = self.pos;
        while end < self.bytes.len() {
            match self.bytes[end] {
                b'\n' => break,
                b'\r' if self.bytes.get(end + 1) == Some(&b'\n') => break,
                b'?' if self.bytes.get(end + 1) == Some(&b'>') => break,
                _ => end += 1,
            }
        }
        self.emit(TokenKind::Comment, end);
    }

    fn lex_block_comment(&mut self) {
        match self.src[self.pos + 2..].find("*/") {
            Some(idx) => self.emit(TokenKind::Comment, self.pos + 2 + idx + 2),
            None => self.unterminated(
                TokenKind::Comment,
                DiagnosticKind::UnterminatedComment,
                "comment",
            ),
        }
    }

    fn lex_quoted(&mut self) {
        match quoted_end(self.bytes, self.pos) {
            Some(end) => self.emit(TokenKind::String, end),
            None => self.unterminated(
                TokenKind::String,
                DiagnosticKind::UnterminatedString,
                "string",
            ),
        }
    }

    /// Returns `false` when `<<<` does not start a heredoc, so the caller
    /// falls back to operator matching.
    fn lex_heredoc(&mut self) -> bool {
        let src = self.src;
        let mut i = self.pos + 3;
        while i < self.bytes.len() && matches!(self.bytes[i], b' ' | b'\t') {
            i += 1;
        }
        let quote = match self.bytes.get(i) {
            Some(&q @ (b'\'' | b'"')) => {
                i += 1;
                Some(q)
            }
            _ => None,
        };
        if !self.bytes.get(i).copied().is_some_and(is_ident_start) {
            return false;
        }
        let label_start = i;
        let label_end = self.scan_ident(i);
        let label = &src[label_start..label_end];
        i = label_end;
        if let Some(q) = quote {
            if self.bytes.get(i) != Some(&q) {
                return false;
            }
            i += 1;
        }
        match self.bytes.get(i) {
            Some(b'\n') => i += 1,
            Some(b'\r') if self.bytes.get(i + 1) == Some(&b'\n') => i += 2,
            _ => return false,
        }

        let mut line_start = i;
        while line_start <= self.bytes.len() {
            let mut j = line_start;
            while j < self.bytes.len() && matches!(self.bytes[j], b' ' | b'\t') {
                j += 1;
            }
            if src[j..].starts_with(label) {
                let after = j + label.len();
                if !self.bytes.get(after).copied().is_some_and(is_ident_char) {
                    self.emit(TokenKind::String, after);
                    return true;
                }
            }
            match src[line_start..].find('\n') {
                Some(nl) => line_start += nl + 1,
                None => break,
            }
        }
        self.unterminated(
            TokenKind::String,
            DiagnosticKind::UnterminatedHeredoc,
            "heredoc",
        );
        true
    }

    fn scan_ident(&self, from: usize) -> usize {
        let mut end = from;
        while end < self.bytes.len() && is_ident_char(self.bytes[end]) {
            end += 1;
        }
        end
    }

    /// Identifier, qualified name or keyword.
    fn lex_name(&mut self) {
        let mut end = self.pos;
        loop {
            if self.bytes.get(end) == Some(&b'\\') {
                if !self.bytes.get(end + 1).copied().is_some_and(is_ident_start) {
                    break;
                }
                end += 1;
            }
            let next = self.scan_ident(end);
            if next == end {
                break;
            }
            end = next;
            if self.bytes.get(end) != Some(&b'\\') {
                break;
            }
        }
        let text = &self.src[self.pos..end];
        // Member names after `->` and `::` are never keywords (`Foo::class`).
        let after_member = self.tokens.iter().rev().find(|t| !t.is_trivia()).is_some_and(|t| {
            t.kind == TokenKind::Punct && matches!(t.text.as_str(), "->" | "?->" | "::")
        });
        let kind = if !after_member
            && !text.contains('\\')
            && KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(text))
        {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.emit(kind, end);
    }

    fn lex_number(&mut self) {
        let mut end = self.pos;
        let mut seen_dot = false;
        while end < self.bytes.len() {
            let c = self.bytes[end];
            if c.is_ascii_alphanumeric() || c == b'_' {
                if matches!(c, b'e' | b'E')
                    && matches!(self.bytes.get(end + 1), Some(b'+' | b'-'))
                    && self.bytes.get(end + 2).is_some_and(|d| d.is_ascii_digit())
                {
                    end += 2;
                }
                end += 1;
            } else if c == b'.'
                && !seen_dot
                && self.bytes.get(end + 1).is_some_and(|d| d.is_ascii_digit())
            {
                seen_dot = true;
                end += 1;
            } else {
                break;
            }
        }
        self.emit(TokenKind::Number, end);
    }

    fn lex_punct(&mut self) {
        if let Some(op) = OPERATORS.iter().find(|op| self.starts_with(op)) {
            self.emit(TokenKind::Punct, self.pos + op.len());
            return;
        }
        let b = self.bytes[self.pos];
        if SINGLE_PUNCT.contains(&b) {
            self.emit(TokenKind::Punct, self.pos + 1);
            return;
        }
        // Only ASCII bytes reach this point, so one byte is one char.
        self.issue(
            DiagnosticKind::UnexpectedCharacter,
            format!("unexpected character {:?}", b as char),
        );
        self.emit(TokenKind::Punct, self.pos + 1);
    }
}

/// End (exclusive) of the quoted literal opening at `start`, or `None` when
/// it runs to EOF.
///
/// Double-quoted and backtick literals may embed `{$expr}` / `${expr}`,
/// whose code can hold further quoted literals, so a quote inside the braces
/// does not close the outer string. Nesting is tracked on a stack of
/// `(quote, brace depth)` pairs.
fn quoted_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut stack: Vec<(u8, usize)> = vec![(bytes[start], 0)];
    let mut i = start + 1;
    while i < bytes.len() {
        let c = bytes[i];
        let next = bytes.get(i + 1).copied();
        let (quote, depth) = stack.last_mut()?;
        if *depth == 0 {
            let interpolates = *quote != b'\'';
            match c {
                b'\\' => i += 2,
                c if c == *quote => {
                    stack.pop();
                    i += 1;
                    if stack.is_empty() {
                        return Some(i);
                    }
                }
                b'{' if interpolates && next == Some(b'$') => {
                    *depth = 1;
                    i += 2;
                }
                b'$' if interpolates && next == Some(b'{') => {
                    *depth = 1;
                    i += 2;
                }
                _ => i += 1,
            }
        } else {
            match c {
                b'\'' | b'"' | b'`' => stack.push((c, 0)),
                b'{' => *depth += 1,
                b'}' => *depth -= 1,
                _ => {}
            }
            i += 1;
        }
    }
    None
}
