/// Language front ends of the audit engine.
///
/// Each front end is a module exposing a `parse_<language>` function that
/// fills a [`ir::FileIR`]. WordPress plugins are PHP, so that is the only
/// one.
pub mod php;
pub use php::{parse_php, parse_php_with_deadline};
