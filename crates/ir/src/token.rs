//! Lexical tokens produced by the PHP front end.
//!
//! Tokens keep their literal text together with the byte offset at which
//! they start, so any range of tokens can be mapped back to the exact
//! source text it spans.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Bare or namespace-qualified name: `add_action`, `\Foo\bar`.
    Identifier,
    /// `$name`, including `$this`.
    Variable,
    /// Reserved word, matched case-insensitively.
    Keyword,
    /// Quoted, heredoc or nowdoc literal, quotes included.
    String,
    Number,
    Punct,
    /// `//`, `#` and `/* */` comments.
    Comment,
    /// Text outside `<?php ... ?>`.
    InlineHtml,
    OpenTag,
    CloseTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the first character in the source.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in bytes.
    pub column: usize,
}

impl Token {
    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text.eq_ignore_ascii_case(kw)
    }

    /// Comments carry no code and are skipped by every structural pass.
    pub fn is_trivia(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    /// Last namespace segment of an identifier (`\Foo\bar` -> `bar`).
    ///
    /// # Example
    /// ```
    /// use ir::{Token, TokenKind};
    /// let tok = Token {
    ///     kind: TokenKind::Identifier,
    ///     text: "\\WP\\current_user_can".into(),
    ///     offset: 0,
    ///     line: 1,
    ///     column: 1,
    /// };
    /// assert_eq!(tok.name(), "current_user_can");
    /// ```
    pub fn name(&self) -> &str {
        self.text.rsplit('\\').next().unwrap_or(&self.text)
    }

    /// Case-insensitive comparison of [`Token::name`] for identifiers.
    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.name().eq_ignore_ascii_case(name)
    }

    /// Value of a constant string literal with quotes removed and escapes
    /// resolved. Returns `None` for anything that is not a plain quoted
    /// string, including double-quoted strings that interpolate variables.
    pub fn string_value(&self) -> Option<String> {
        if self.kind != TokenKind::String || self.text.len() < 2 {
            return None;
        }
        let quote = self.text.chars().next()?;
        if !matches!(quote, '\'' | '"') || !self.text.ends_with(quote) {
            return None;
        }
        let inner = &self.text[1..self.text.len() - 1];
        if quote == '\'' {
            Some(unescape_single(inner))
        } else {
            unescape_double(inner)
        }
    }
}

fn unescape_single(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\'' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn unescape_double(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('$') => out.push('$'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '$' => {
                if chars
                    .peek()
                    .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_' || *n == '{')
                {
                    return None;
                }
                out.push('$');
            }
            '{' if chars.peek() == Some(&'$') => return None,
            _ => out.push(c),
        }
    }
    Some(out)
}

/// Half-open range `[start, end)` of token indices within one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenRange {
    pub start: usize,
    pub end: usize,
}

impl TokenRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx >= self.start && idx < self.end
    }
}
