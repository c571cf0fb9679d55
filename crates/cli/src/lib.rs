//! Common utilities for the command line interface.
use regex::Regex;
use std::fs;
use std::path::Path;

pub mod args;
pub mod config;
pub mod output;
pub mod scan;
pub mod tokens;
pub mod ui;

/// Converts a basic glob pattern to a regular expression.
///
/// `*` stays inside one path segment, `**` crosses segments and a leading
/// `**/` also matches at the root.
///
/// # Example
///
/// ```
/// use wp_ajax_audit::glob_to_regex;
/// let re = glob_to_regex("includes/*.php").unwrap();
/// assert!(re.is_match("includes/ajax.php"));
/// assert!(!re.is_match("includes/admin/ajax.php"));
/// let re = glob_to_regex("**/vendor/**").unwrap();
/// assert!(re.is_match("vendor/autoload.php"));
/// ```
pub fn glob_to_regex(pat: &str) -> Result<Regex, String> {
    if pat.contains('[') || pat.contains(']') {
        return Err(format!("character classes are not supported: {pat}"));
    }
    let mut regex = String::from("^");
    let mut chars = pat.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    regex.push_str("(?:.*/)?");
                } else {
                    regex.push_str(".*");
                }
            }
            '*' => regex.push_str("[^/]*"),
            '?' => regex.push_str("[^/]"),
            '.' | '(' | ')' | '+' | '|' | '^' | '$' | '{' | '}' | '\\' => {
                regex.push('\\');
                regex.push(c);
            }
            _ => regex.push(c),
        }
    }
    regex.push('$');
    Regex::new(&regex).map_err(|e| e.to_string())
}

/// Transforms a glob-style exclusion string into [`Regex`].
/// A trailing slash excludes the whole directory.
///
/// # Example
///
/// ```
/// use wp_ajax_audit::parse_exclude;
/// let re = parse_exclude("tests/").unwrap();
/// assert!(re.is_match("tests/bootstrap.php"));
/// ```
pub fn parse_exclude(s: &str) -> Result<Regex, String> {
    let glob_str = if s.ends_with('/') {
        format!("{s}**")
    } else {
        s.to_string()
    };
    glob_to_regex(&glob_str)
}

/// Default exclusion patterns: VCS metadata and bundled dependencies.
pub fn default_excludes() -> Vec<Regex> {
    ["**/node_modules/**", "**/.git/**", "**/vendor/**"]
        .into_iter()
        .filter_map(|p| parse_exclude(p).ok())
        .collect()
}

/// Reads `.gitignore` from `root` and converts its entries to regular
/// expressions. Negated entries are not supported and are skipped.
pub fn load_ignore_patterns(root: &Path) -> Vec<Regex> {
    let Ok(content) = fs::read_to_string(root.join(".gitignore")) else {
        return Vec::new();
    };
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'))
        .filter_map(|line| {
            let mut pat = line.trim_start_matches('/').to_string();
            if !pat.starts_with("**/") {
                pat = format!("**/{pat}");
            }
            parse_exclude(&pat).ok()
        })
        .collect()
}

/// Whether a `/`-separated path relative to the plugin root is excluded.
/// Directories match their `dir/**` patterns so the walk can prune them.
///
/// # Example
///
/// ```
/// use wp_ajax_audit::{is_excluded, parse_exclude};
/// let patterns = vec![parse_exclude("legacy/**").unwrap()];
/// assert!(is_excluded("legacy/old.php", &patterns));
/// assert!(is_excluded("legacy", &patterns));
/// assert!(!is_excluded("legacy-loader.php", &patterns));
/// ```
pub fn is_excluded(rel_path: &str, patterns: &[Regex]) -> bool {
    let path = rel_path.replace('\\', "/");
    let as_dir = format!("{}/", path.trim_end_matches('/'));
    patterns
        .iter()
        .any(|re| re.is_match(&path) || re.is_match(&as_dir))
}
