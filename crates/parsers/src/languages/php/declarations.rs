//! Function, method and class structure of one PHP file.

use super::{code_indices, is_member_access};
use ir::{Declaration, Meta, Token, TokenKind, TokenRange};

/// Body of a class-like construct (`class`, `interface`, `trait`, `enum`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSpan {
    /// `None` for anonymous classes.
    pub name: Option<String>,
    pub body: TokenRange,
}

#[derive(Debug, Clone, Default)]
pub struct Structure {
    pub declarations: Vec<Declaration>,
    pub classes: Vec<ClassSpan>,
}

impl Structure {
    /// Name of the innermost class whose body contains token `idx`.
    pub fn enclosing_class(&self, idx: usize) -> Option<&str> {
        self.classes
            .iter()
            .filter(|c| c.body.contains(idx))
            .min_by_key(|c| c.body.len())
            .and_then(|c| c.name.as_deref())
    }
}

enum Pending {
    Class(Option<String>),
    /// `decl` is `None` for closures and for methods of anonymous classes.
    /// Otherwise it holds the name, the name token and the first token.
    Function {
        decl: Option<(String, usize, usize)>,
    },
}

fn is_modifier(tok: &Token) -> bool {
    ["public", "protected", "private", "static", "abstract", "final"]
        .iter()
        .any(|m| tok.is_keyword(m))
}

enum Frame {
    Class { span: usize },
    Function { decl: Option<usize> },
    Block,
}

/// Collects declarations with bodies and the class spans of a file.
///
/// Abstract and interface methods have no body and are not recorded.
/// Named functions that are not directly inside a class body are global
/// functions, including those nested in `if` blocks or other functions.
pub fn collect_declarations(tokens: &[Token], file: &str) -> Structure {
    let code = code_indices(tokens);
    let mut out = Structure::default();
    let mut stack: Vec<(Frame, usize)> = Vec::new();
    let mut pending: Option<Pending> = None;

    let current_class = |stack: &[(Frame, usize)], out: &Structure| -> Option<Option<String>> {
        match stack.last() {
            Some((Frame::Class { span }, _)) => Some(out.classes[*span].name.clone()),
            _ => None,
        }
    };

    for (p, &idx) in code.iter().enumerate() {
        let tok = &tokens[idx];
        let prev = p.checked_sub(1).map(|q| &tokens[code[q]]);
        let next = code.get(p + 1).map(|&n| &tokens[n]);

        if tok.is_keyword("class")
            || tok.is_keyword("interface")
            || tok.is_keyword("trait")
            || (tok.is_name("enum")
                && !prev.is_some_and(is_member_access)
                && next.is_some_and(|n| n.kind == TokenKind::Identifier))
        {
            let anonymous = prev.is_some_and(|t| t.is_keyword("new"));
            let name = match next {
                Some(n) if !anonymous && n.kind == TokenKind::Identifier => Some(n.text.clone()),
                _ => None,
            };
            pending = Some(Pending::Class(name));
            continue;
        }

        if tok.is_keyword("function") {
            let mut q = p + 1;
            if code.get(q).is_some_and(|&n| tokens[n].is_punct("&")) {
                q += 1;
            }
            let named = code
                .get(q)
                .map(|&n| &tokens[n])
                .filter(|n| matches!(n.kind, TokenKind::Identifier | TokenKind::Keyword));
            let decl = match named {
                Some(_) if prev.is_some_and(|t| t.is_keyword("use")) => None,
                Some(n) => match current_class(&stack, &out) {
                    Some(None) => None,
                    _ => {
                        let mut first = p;
                        while first > 0 && is_modifier(&tokens[code[first - 1]]) {
                            first -= 1;
                        }
                        Some((n.text.clone(), code[q], code[first]))
                    }
                },
                None => None,
            };
            pending = Some(Pending::Function { decl });
            continue;
        }

        if tok.kind != TokenKind::Punct {
            continue;
        }
        match tok.text.as_str() {
            ";" => pending = None,
            "{" => {
                let frame = match pending.take() {
                    Some(Pending::Class(name)) => {
                        out.classes.push(ClassSpan {
                            name,
                            body: TokenRange::new(idx + 1, tokens.len()),
                        });
                        Frame::Class {
                            span: out.classes.len() - 1,
                        }
                    }
                    Some(Pending::Function { decl }) => {
                        let decl = decl.map(|(name, name_idx, first)| {
                            let class = current_class(&stack, &out).flatten();
                            out.declarations.push(Declaration {
                                name,
                                class,
                                meta: Meta::at(file, &tokens[name_idx]),
                                body: TokenRange::new(idx + 1, tokens.len()),
                                span: TokenRange::new(first, tokens.len()),
                            });
                            out.declarations.len() - 1
                        });
                        Frame::Function { decl }
                    }
                    None => Frame::Block,
                };
                stack.push((frame, idx));
            }
            "}" => match stack.pop() {
                Some((Frame::Class { span }, _)) => out.classes[span].body.end = idx,
                Some((Frame::Function { decl: Some(d) }, _)) => {
                    out.declarations[d].body.end = idx;
                    out.declarations[d].span.end = idx + 1;
                }
                _ => {}
            },
            _ => {}
        }
    }
    out
}
