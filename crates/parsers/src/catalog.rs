//! Names the analyzer looks for inside callback bodies.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Capability and nonce primitives.
    pub security_checks: HashSet<String>,
    /// Functions that change state or send data back to the client.
    pub sensitive_functions: HashSet<String>,
    /// Function name prefixes treated like `sensitive_functions`.
    pub sensitive_prefixes: Vec<String>,
    /// Methods (called with `->` or `::`) with the same effect, e.g. `$wpdb->query`.
    pub sensitive_methods: HashSet<String>,
    /// Statements such as `echo` that emit output.
    pub sensitive_keywords: HashSet<String>,
}

impl Catalog {
    /// Built-in PHP/WordPress catalog.
    pub fn php() -> Self {
        crate::languages::php::catalog::load_catalog()
    }

    /// Adds user supplied function names to the sensitive set.
    pub fn extend<I, S>(&mut self, functions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sensitive_functions
            .extend(functions.into_iter().map(|s| s.as_ref().to_ascii_lowercase()));
    }

    pub fn is_security_check(&self, name: &str) -> bool {
        self.security_checks.contains(&name.to_ascii_lowercase())
    }

    pub fn is_sensitive_function(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.sensitive_functions.contains(&name)
            || self.sensitive_prefixes.iter().any(|p| name.starts_with(p))
    }

    pub fn is_sensitive_method(&self, name: &str) -> bool {
        self.sensitive_methods.contains(&name.to_ascii_lowercase())
    }

    pub fn is_sensitive_keyword(&self, name: &str) -> bool {
        self.sensitive_keywords.contains(&name.to_ascii_lowercase())
    }
}
