//! Extraction of `add_action('wp_ajax_*', ...)` registrations.

use super::declarations::Structure;
use super::{code_indices, is_member_access, matching_close};
use ir::{
    CallbackRef, ClassRef, Diagnostic, DiagnosticKind, HookRegistration, HookType, Meta, Token,
    TokenKind, TokenRange,
};

/// Registrations found in one file plus the calls that could not be read.
#[derive(Debug, Clone, Default)]
pub struct HookScan {
    pub hooks: Vec<HookRegistration>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One argument of a call, as positions into the code index list.
#[derive(Debug, Clone, Copy)]
struct Arg {
    start: usize,
    end: usize,
}

impl Arg {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

struct Ctx<'a> {
    tokens: &'a [Token],
    code: &'a [usize],
    source: &'a str,
}

impl<'a> Ctx<'a> {
    fn tok(&self, p: usize) -> &'a Token {
        &self.tokens[self.code[p]]
    }

    fn text(&self, arg: Arg) -> &'a str {
        if arg.len() == 0 {
            return "";
        }
        let start = self.tok(arg.start).offset;
        let end = self.tok(arg.end - 1).end();
        self.source.get(start..end).unwrap_or("")
    }

    /// Splits the argument list between `open` and its matching `close`.
    fn split_args(&self, open: usize, close: usize) -> Vec<Arg> {
        let mut args = Vec::new();
        let mut start = open + 1;
        let mut p = open + 1;
        while p < close {
            let t = self.tok(p);
            if t.kind == TokenKind::Punct && matches!(t.text.as_str(), "(" | "[" | "{" | "#[") {
                p = matching_close(self.tokens, self.code, p).unwrap_or(close);
            } else if t.is_punct(",") {
                args.push(Arg { start, end: p });
                start = p + 1;
            }
            p += 1;
        }
        if start < close {
            args.push(Arg { start, end: close });
        }
        args
    }
}

/// Finds every AJAX hook registration in a tokenized file.
///
/// The hook name must be a constant string literal. Calls to methods or
/// declarations named `add_action` are ignored, as is anything inside
/// strings and comments.
pub fn find_hook_registrations(
    tokens: &[Token],
    source: &str,
    file: &str,
    structure: &Structure,
) -> HookScan {
    let code = code_indices(tokens);
    let ctx = Ctx {
        tokens,
        code: &code,
        source,
    };
    let mut scan = HookScan::default();

    for p in 0..code.len() {
        let tok = ctx.tok(p);
        if !tok.is_name("add_action") {
            continue;
        }
        if p > 0 {
            let prev = ctx.tok(p - 1);
            if is_member_access(prev) || prev.is_keyword("function") {
                continue;
            }
        }
        if !code.get(p + 1).is_some_and(|&n| tokens[n].is_punct("(")) {
            continue;
        }
        let Some(close) = matching_close(tokens, &code, p + 1) else {
            scan.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::MalformedHookCall,
                    file,
                    "add_action call has no closing parenthesis",
                )
                .at_line(tok.line),
            );
            continue;
        };
        let args = ctx.split_args(p + 1, close);
        let Some(hook_name) = args
            .first()
            .filter(|a| a.len() == 1)
            .and_then(|a| ctx.tok(a.start).string_value())
        else {
            continue;
        };
        if HookType::from_hook_name(&hook_name).is_none() {
            continue;
        }
        let Some(cb_arg) = args.get(1).filter(|a| a.len() > 0) else {
            scan.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::MalformedHookCall,
                    file,
                    format!("add_action('{hook_name}') has no callback argument"),
                )
                .at_line(tok.line),
            );
            continue;
        };
        let callback = classify_callback(&ctx, *cb_arg);
        let enclosing_class = structure.enclosing_class(code[p]).map(str::to_string);
        if let Some(reg) =
            HookRegistration::new(hook_name, callback, Meta::at(file, tok), enclosing_class)
        {
            scan.hooks.push(reg);
        }
    }
    scan
}

fn dynamic(ctx: &Ctx, arg: Arg) -> CallbackRef {
    CallbackRef::Dynamic {
        expr: ctx.text(arg).to_string(),
    }
}

fn classify_callback(ctx: &Ctx, arg: Arg) -> CallbackRef {
    let first = ctx.tok(arg.start);

    if arg.len() == 1 && first.kind == TokenKind::String {
        return match first.string_value() {
            Some(value) => string_callback(&value).unwrap_or_else(|| dynamic(ctx, arg)),
            None => dynamic(ctx, arg),
        };
    }

    if let Some(cb) = closure_callback(ctx, arg) {
        return cb;
    }
    if let Some(cb) = array_callback(ctx, arg) {
        return cb;
    }
    if let Some(cb) = first_class_callable(ctx, arg) {
        return cb;
    }
    dynamic(ctx, arg)
}

/// `'func'`, `'\ns\func'` or `'Class::method'`.
fn string_callback(value: &str) -> Option<CallbackRef> {
    let value = value.trim();
    let valid = |s: &str| {
        !s.is_empty()
            && s.split('\\').all(|seg| {
                !seg.is_empty()
                    && seg
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80)
            })
    };
    match value.split_once("::") {
        Some((class, method)) => {
            let class = class.trim_start_matches('\\');
            if !valid(class) || !valid(method) {
                return None;
            }
            Some(CallbackRef::Method {
                class: class_ref_from_name(class),
                method: method.to_string(),
            })
        }
        None => {
            let name = value.trim_start_matches('\\');
            valid(name).then(|| CallbackRef::Function {
                name: name.to_string(),
            })
        }
    }
}

fn class_ref_from_name(name: &str) -> ClassRef {
    if name.eq_ignore_ascii_case("self") || name.eq_ignore_ascii_case("static") {
        ClassRef::SelfClass
    } else {
        ClassRef::Named(name.to_string())
    }
}

/// `function (...) use (...) { ... }`, `static function ...`, `fn (...) => expr`.
fn closure_callback(ctx: &Ctx, arg: Arg) -> Option<CallbackRef> {
    let mut p = arg.start;
    if ctx.tok(p).is_keyword("static") {
        p += 1;
    }
    if p >= arg.end {
        return None;
    }
    let head = ctx.tok(p);
    if head.is_keyword("function") {
        let open = (p + 1..arg.end).find(|&q| ctx.tok(q).is_punct("{"))?;
        let close = matching_close(ctx.tokens, ctx.code, open)
            .filter(|&c| c < arg.end)
            .map(|c| ctx.code[c])
            .unwrap_or_else(|| ctx.code[arg.end - 1] + 1);
        return Some(CallbackRef::Closure {
            body: TokenRange::new(ctx.code[open] + 1, close),
        });
    }
    if head.is_keyword("fn") {
        let arrow = (p + 1..arg.end).find(|&q| ctx.tok(q).is_punct("=>"))?;
        let end = ctx.code[arg.end - 1] + 1;
        return Some(CallbackRef::Closure {
            body: TokenRange::new(ctx.code[arrow] + 1, end),
        });
    }
    None
}

/// `array($this, 'm')`, `[Foo::class, 'm']`, `[new Foo(), 'm']`, ...
fn array_callback(ctx: &Ctx, arg: Arg) -> Option<CallbackRef> {
    let first = ctx.tok(arg.start);
    let open = if first.is_keyword("array") && ctx.tok(arg.start + 1).is_punct("(") {
        arg.start + 1
    } else if first.is_punct("[") {
        arg.start
    } else {
        return None;
    };
    let close = matching_close(ctx.tokens, ctx.code, open)?;
    if close + 1 != arg.end {
        return None;
    }
    let elems = ctx.split_args(open, close);
    let [target, method] = elems.as_slice() else {
        return Some(dynamic(ctx, arg));
    };
    let method = match (method.len(), ctx.tok(method.start).string_value()) {
        (1, Some(m)) if !m.is_empty() => m,
        _ => return Some(dynamic(ctx, arg)),
    };
    let class = match class_target(ctx, *target) {
        Some(class) => class,
        None => return Some(dynamic(ctx, arg)),
    };
    Some(CallbackRef::Method { class, method })
}

/// The object or class half of an array callback.
fn class_target(ctx: &Ctx, target: Arg) -> Option<ClassRef> {
    let toks: Vec<&Token> = (target.start..target.end).map(|p| ctx.tok(p)).collect();
    // PHP 4 style `array(&$this, 'm')` passes the object by reference.
    let toks = match toks.as_slice() {
        [amp, rest @ ..] if amp.is_punct("&") => rest,
        all => all,
    };
    match toks {
        [t] if t.kind == TokenKind::Variable && t.text == "$this" => Some(ClassRef::This),
        [t] if t.is_name("__CLASS__") => Some(ClassRef::SelfClass),
        [t] if t.kind == TokenKind::String => {
            let name = t.string_value()?;
            let name = name.trim_start_matches('\\');
            if name.is_empty() {
                return None;
            }
            Some(class_ref_from_name(name))
        }
        [c, sep, k]
            if sep.is_punct("::")
                && k.text.eq_ignore_ascii_case("class")
                && (c.kind == TokenKind::Identifier || c.is_keyword("static")) =>
        {
            Some(class_ref_from_name(c.text.trim_start_matches('\\')))
        }
        [f, open, this, close]
            if f.is_name("get_class")
                && open.is_punct("(")
                && this.text == "$this"
                && close.is_punct(")") =>
        {
            Some(ClassRef::SelfClass)
        }
        [new, class, rest @ ..]
            if new.is_keyword("new")
                && (class.kind == TokenKind::Identifier || class.is_keyword("static"))
                && (rest.is_empty()
                    || (rest[0].is_punct("(") && rest.last().is_some_and(|t| t.is_punct(")")))) =>
        {
            Some(class_ref_from_name(class.text.trim_start_matches('\\')))
        }
        _ => None,
    }
}

/// PHP 8.1 first-class callables: `handler(...)`, `$this->m(...)`,
/// `Foo::m(...)`.
fn first_class_callable(ctx: &Ctx, arg: Arg) -> Option<CallbackRef> {
    let toks: Vec<&Token> = (arg.start..arg.end).map(|p| ctx.tok(p)).collect();
    let n = toks.len();
    if n < 4
        || !toks[n - 3].is_punct("(")
        || !toks[n - 2].is_punct("...")
        || !toks[n - 1].is_punct(")")
    {
        return None;
    }
    match &toks[..n - 3] {
        [f] if f.kind == TokenKind::Identifier => Some(CallbackRef::Function {
            name: f.text.trim_start_matches('\\').to_string(),
        }),
        [this, arrow, m]
            if this.text == "$this"
                && (arrow.is_punct("->") || arrow.is_punct("?->"))
                && m.kind == TokenKind::Identifier =>
        {
            Some(CallbackRef::Method {
                class: ClassRef::This,
                method: m.text.clone(),
            })
        }
        [c, sep, m]
            if sep.is_punct("::")
                && m.kind == TokenKind::Identifier
                && (c.kind == TokenKind::Identifier || c.is_keyword("static")) =>
        {
            Some(CallbackRef::Method {
                class: class_ref_from_name(c.text.trim_start_matches('\\')),
                method: m.text.clone(),
            })
        }
        _ => None,
    }
}
