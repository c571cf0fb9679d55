//! Maps a hook's callback reference to the body that implements it.

use crate::index::{DeclarationIndex, Located};
use ir::{
    CallbackRef, ClassRef, Diagnostic, DiagnosticKind, FileIR, HookRegistration, Resolution,
    TokenRange,
};

/// Body of a resolved callback.
#[derive(Debug, Clone, Copy)]
pub struct CallbackDefinition<'a> {
    pub file: &'a FileIR,
    pub body: TokenRange,
    /// Source shown for the callback: the whole declaration of a named
    /// callback, the body of a closure.
    pub source: TokenRange,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    pub resolution: Resolution,
    pub definition: Option<CallbackDefinition<'a>>,
    /// Explains every outcome other than a unique match.
    pub diagnostic: Option<Diagnostic>,
}

impl<'a> Resolved<'a> {
    fn missing(resolution: Resolution, diagnostic: Diagnostic) -> Self {
        Self {
            resolution,
            definition: None,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Resolves the callback of `reg`, which was registered in `file`.
///
/// Never fails: callbacks that cannot be found come back as `NotFound` or
/// `Dynamic` with an info diagnostic, and the caller reports them as
/// `unknown`.
pub fn resolve<'a>(
    reg: &HookRegistration,
    file: &'a FileIR,
    index: &DeclarationIndex<'a>,
) -> Resolved<'a> {
    let diag = |kind, msg: String| Diagnostic::new(kind, &reg.meta.file, msg).at_line(reg.meta.line);
    match &reg.callback {
        CallbackRef::Closure { body } => Resolved {
            resolution: Resolution::Closure,
            definition: Some(CallbackDefinition {
                file,
                body: *body,
                source: *body,
                line: reg.meta.line,
            }),
            diagnostic: None,
        },
        CallbackRef::Dynamic { expr } => Resolved::missing(
            Resolution::Dynamic,
            diag(
                DiagnosticKind::DynamicCallback,
                format!("callback of {} is computed at runtime: {expr}", reg.hook_name),
            ),
        ),
        CallbackRef::Function { name } => {
            pick(reg, index.functions(name), name).unwrap_or_else(|| {
                Resolved::missing(
                    Resolution::NotFound,
                    diag(
                        DiagnosticKind::UnresolvedCallback,
                        format!("no function named {name} for {}", reg.hook_name),
                    ),
                )
            })
        }
        CallbackRef::Method { class, method } => {
            let class_name = match class {
                ClassRef::Named(name) => Some(name.as_str()),
                ClassRef::This | ClassRef::SelfClass => reg.enclosing_class.as_deref(),
            };
            let Some(class_name) = class_name else {
                return Resolved::missing(
                    Resolution::NotFound,
                    diag(
                        DiagnosticKind::UnresolvedCallback,
                        format!(
                            "{} refers to the current class outside of any class",
                            reg.hook_name
                        ),
                    ),
                );
            };
            let display = format!("{class_name}::{method}");
            pick(reg, index.methods(class_name, method), &display).unwrap_or_else(|| {
                Resolved::missing(
                    Resolution::NotFound,
                    diag(
                        DiagnosticKind::UnresolvedCallback,
                        format!("no method {display} for {}", reg.hook_name),
                    ),
                )
            })
        }
    }
}

/// First candidate wins; more than one makes the outcome ambiguous.
fn pick<'a>(reg: &HookRegistration, found: &[Located<'a>], name: &str) -> Option<Resolved<'a>> {
    let first = found.first()?;
    let definition = Some(CallbackDefinition {
        file: first.file,
        body: first.decl.body,
        source: first.decl.span,
        line: first.decl.meta.line,
    });
    if found.len() == 1 {
        return Some(Resolved {
            resolution: Resolution::Resolved,
            definition,
            diagnostic: None,
        });
    }
    let candidates: Vec<String> = found
        .iter()
        .map(|c| format!("{}:{}", c.file.file_path, c.decl.meta.line))
        .collect();
    let diagnostic = Diagnostic::new(
        DiagnosticKind::AmbiguousCallback,
        &reg.meta.file,
        format!(
            "{name} is declared {} times, analyzing {}",
            candidates.len(),
            candidates[0]
        ),
    )
    .at_line(reg.meta.line);
    Some(Resolved {
        resolution: Resolution::Ambiguous { candidates },
        definition,
        diagnostic: Some(diagnostic),
    })
}
