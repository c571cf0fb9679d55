//! Hook registrations and the declarations their callbacks point to.

use crate::{Meta, TokenRange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of AJAX hook, derived from the hook name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookType {
    /// Reachable by logged-in users only.
    #[serde(rename = "wp_ajax")]
    WpAjax,
    /// Reachable by anonymous visitors.
    #[serde(rename = "wp_ajax_nopriv")]
    WpAjaxNopriv,
}

impl HookType {
    pub const PREFIX: &'static str = "wp_ajax_";
    pub const NOPRIV_PREFIX: &'static str = "wp_ajax_nopriv_";

    /// Classifies a hook name, returning `None` when it is not an AJAX hook
    /// (`^wp_ajax(_nopriv)?_.+`).
    ///
    /// # Example
    /// ```
    /// use ir::HookType;
    /// assert_eq!(HookType::from_hook_name("wp_ajax_save"), Some(HookType::WpAjax));
    /// assert_eq!(
    ///     HookType::from_hook_name("wp_ajax_nopriv_contact"),
    ///     Some(HookType::WpAjaxNopriv)
    /// );
    /// assert_eq!(HookType::from_hook_name("wp_ajax_"), None);
    /// assert_eq!(HookType::from_hook_name("init"), None);
    /// ```
    pub fn from_hook_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(Self::PREFIX)?;
        if rest.is_empty() || rest.contains('\n') {
            return None;
        }
        if name.starts_with(Self::NOPRIV_PREFIX) {
            Some(HookType::WpAjaxNopriv)
        } else {
            Some(HookType::WpAjax)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HookType::WpAjax => "wp_ajax",
            HookType::WpAjaxNopriv => "wp_ajax_nopriv",
        }
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class side of a `[Class, 'method']` callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ClassRef {
    /// `$this`
    This,
    /// `self`, `static`, `__CLASS__`, `self::class`
    SelfClass,
    /// A class named explicitly, possibly namespace-qualified.
    Named(String),
}

/// What the second argument of `add_action` refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallbackRef {
    Function { name: String },
    Method { class: ClassRef, method: String },
    /// Inline closure or arrow function; the body is already known.
    Closure { body: TokenRange },
    /// Anything that cannot be resolved without running PHP.
    Dynamic { expr: String },
}

impl CallbackRef {
    /// Human readable callback name as shown in reports.
    pub fn display_name(&self, enclosing_class: Option<&str>) -> String {
        match self {
            CallbackRef::Function { name } => name.clone(),
            CallbackRef::Method { class, method } => {
                let class = match class {
                    ClassRef::Named(name) => name.as_str(),
                    ClassRef::This => enclosing_class.unwrap_or("$this"),
                    ClassRef::SelfClass => enclosing_class.unwrap_or("self"),
                };
                format!("{class}::{method}")
            }
            CallbackRef::Closure { .. } => "{closure}".to_string(),
            CallbackRef::Dynamic { expr } => expr.clone(),
        }
    }
}

/// A single `add_action('wp_ajax_*', ...)` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookRegistration {
    pub hook_name: String,
    pub hook_type: HookType,
    pub callback: CallbackRef,
    /// Location of the `add_action` identifier.
    pub meta: Meta,
    /// Class whose body contains the call, used for `$this` and `self`.
    pub enclosing_class: Option<String>,
}

impl HookRegistration {
    /// Builds a registration, returning `None` when `hook_name` is not an
    /// AJAX hook. The hook type is always derived from the name.
    pub fn new(
        hook_name: String,
        callback: CallbackRef,
        meta: Meta,
        enclosing_class: Option<String>,
    ) -> Option<Self> {
        let hook_type = HookType::from_hook_name(&hook_name)?;
        Some(Self {
            hook_name,
            hook_type,
            callback,
            meta,
            enclosing_class,
        })
    }

    pub fn callback_name(&self) -> String {
        self.callback.display_name(self.enclosing_class.as_deref())
    }
}

/// A function or method declaration with a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    /// Owning class, interface, trait or enum for methods.
    pub class: Option<String>,
    /// Location of the declared name.
    pub meta: Meta,
    /// Tokens between the body braces, braces excluded.
    pub body: TokenRange,
    /// The whole declaration, from its first modifier through the closing
    /// brace.
    pub span: TokenRange,
}

impl Declaration {
    pub fn is_method(&self) -> bool {
        self.class.is_some()
    }

    pub fn qualified_name(&self) -> String {
        match &self.class {
            Some(class) => format!("{class}::{}", self.name),
            None => self.name.clone(),
        }
    }
}
