// src/patterns/mod.rs
// =============================================================================
// Include/exclude filters supplied by the user.
//
// Two steps, always in this order:
// 1. validate.rs checks every token against a character allow-list and
//    normalizes it ("/src/*.ts" -> "src/*.ts", "dist/" -> "dist/*")
// 2. matcher.rs compiles the normalized tokens into glob match rules
//
// A bad token blocks the whole request before any network call is made.
//
// Rust concepts:
// - Modules: validation and matching live in separate files
// - pub use: re-export the pieces callers need
// =============================================================================

mod matcher;
mod validate;

pub use matcher::{PatternRules, PatternSet};
pub use validate::{normalize_pattern, parse_pattern_list, validate_pattern};
