// src/patterns/matcher.rs
// =============================================================================
// Compiled include/exclude rules.
//
// `*` is allowed to cross directory separators, so "*.md" matches
// "docs/guide.md" and "dist/*" matches "dist/js/app.js". Each rule is
// tested against the full root-relative path and against the bare file
// name.
//
// Rust concepts:
// - globset: compile many globs into one matcher
// - Option<PatternSet>: "no rules" is different from "empty rules"
// =============================================================================

use super::validate::validate_pattern;
use crate::config::IngestionConfig;
use crate::error::{IngestError, IngestResult};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// One compiled group of patterns (all includes, or all excludes).
#[derive(Debug, Clone)]
pub struct PatternSet {
    globs: GlobSet,
    patterns: Vec<String>,
}

impl PatternSet {
    /// Validates, normalizes and compiles a list of raw tokens.
    pub fn compile<S: AsRef<str>>(tokens: &[S]) -> IngestResult<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::with_capacity(tokens.len());

        for token in tokens {
            let token = token.as_ref();
            let normalized = validate_pattern(token)?;
            let glob = GlobBuilder::new(&normalized)
                .literal_separator(false)
                .build()
                .map_err(|e| IngestError::invalid_pattern(token, e.to_string()))?;
            builder.add(glob);
            patterns.push(normalized);
        }

        let globs = builder
            .build()
            .map_err(|e| IngestError::invalid_pattern(&patterns.join(","), e.to_string()))?;
        Ok(Self { globs, patterns })
    }

    pub fn is_match(&self, path: &str) -> bool {
        if self.globs.is_match(path) {
            return true;
        }
        match path.rsplit_once('/') {
            Some((_, name)) => self.globs.is_match(name),
            None => false,
        }
    }

    /// The normalized patterns, in the order given.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Both rule groups for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct PatternRules {
    pub include: Option<PatternSet>,
    pub exclude: Option<PatternSet>,
}

impl PatternRules {
    pub fn from_config(config: &IngestionConfig) -> IngestResult<Self> {
        Ok(Self {
            include: compile_optional(config.include_patterns.as_deref())?,
            exclude: compile_optional(config.exclude_patterns.as_deref())?,
        })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.as_ref().is_some_and(|set| set.is_match(path))
    }

    /// With no include rules configured every path is included.
    pub fn is_included(&self, path: &str) -> bool {
        self.include.as_ref().map_or(true, |set| set.is_match(path))
    }
}

// An empty list behaves like no list at all
fn compile_optional(tokens: Option<&[String]>) -> IngestResult<Option<PatternSet>> {
    match tokens {
        Some(tokens) if !tokens.is_empty() => PatternSet::compile(tokens).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_crosses_directories() {
        let set = PatternSet::compile(&["*.md"]).unwrap();
        assert!(set.is_match("README.md"));
        assert!(set.is_match("docs/guide/intro.md"));
        assert!(!set.is_match("src/main.rs"));
    }

    #[test]
    fn test_directory_pattern_is_normalized() {
        let set = PatternSet::compile(&["dist/"]).unwrap();
        assert_eq!(set.patterns(), ["dist/*"]);
        assert!(set.is_match("dist/app.js"));
        assert!(set.is_match("dist/js/vendor.js"));
        assert!(!set.is_match("src/dist.rs"));
    }

    #[test]
    fn test_name_only_match() {
        let set = PatternSet::compile(&["package-lock.json"]).unwrap();
        assert!(set.is_match("web/package-lock.json"));
    }

    #[test]
    fn test_invalid_token_blocks_compilation() {
        let err = PatternSet::compile(&["ok/*.rs", "bad pattern"]).unwrap_err();
        assert!(err.to_string().contains("bad pattern"));
    }

    #[test]
    fn test_rules_from_config() {
        let config = IngestionConfig {
            include_patterns: Some(vec!["src/".into()]),
            exclude_patterns: Some(vec!["*.test.ts".into()]),
            ..IngestionConfig::default()
        };
        let rules = PatternRules::from_config(&config).unwrap();
        assert!(rules.is_included("src/index.ts"));
        assert!(!rules.is_included("README.md"));
        assert!(rules.is_excluded("src/index.test.ts"));
        assert!(!rules.is_excluded("src/index.ts"));
    }

    #[test]
    fn test_empty_lists_mean_no_rules() {
        let config = IngestionConfig {
            include_patterns: Some(vec![]),
            ..IngestionConfig::default()
        };
        let rules = PatternRules::from_config(&config).unwrap();
        assert!(rules.include.is_none());
        assert!(rules.is_included("anything/at/all"));
        assert!(!rules.is_excluded("anything/at/all"));
    }
}
