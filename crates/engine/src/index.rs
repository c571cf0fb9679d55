//! Corpus-wide lookup of function and method declarations.

use ir::{Declaration, FileIR};
use std::collections::HashMap;

/// A declaration together with the file that holds its tokens.
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    pub file: &'a FileIR,
    pub decl: &'a Declaration,
}

/// Declarations keyed by lower-cased last name segment. Entries keep
/// file-then-line order, so the first entry of a key is the one a tie
/// resolves to.
#[derive(Debug, Default)]
pub struct DeclarationIndex<'a> {
    functions: HashMap<String, Vec<Located<'a>>>,
    methods: HashMap<(String, String), Vec<Located<'a>>>,
}

/// `\Acme\Util\helper` and `HELPER` share the key `helper`.
pub fn lookup_key(name: &str) -> String {
    name.rsplit('\\').next().unwrap_or(name).to_ascii_lowercase()
}

impl<'a> DeclarationIndex<'a> {
    /// Indexes `files`, which must already be sorted by path.
    pub fn build(files: &'a [FileIR]) -> Self {
        let mut index = Self::default();
        for file in files {
            for decl in &file.declarations {
                let entry = Located { file, decl };
                match &decl.class {
                    Some(class) => index
                        .methods
                        .entry((lookup_key(class), lookup_key(&decl.name)))
                        .or_default()
                        .push(entry),
                    None => index
                        .functions
                        .entry(lookup_key(&decl.name))
                        .or_default()
                        .push(entry),
                }
            }
        }
        index
    }

    pub fn functions(&self, name: &str) -> &[Located<'a>] {
        self.functions
            .get(&lookup_key(name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn methods(&self, class: &str, method: &str) -> &[Located<'a>] {
        self.methods
            .get(&(lookup_key(class), lookup_key(method)))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of indexed declarations.
    pub fn len(&self) -> usize {
        self.functions.values().map(Vec::len).sum::<usize>()
            + self.methods.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.methods.is_empty()
    }
}
