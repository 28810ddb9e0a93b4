//! Rule matching: merges the tags of every rule whose glob pattern matches a
//! file's relative path.

use globset::{GlobBuilder, GlobMatcher};
use std::collections::BTreeMap;

use crate::sync::config::SyncRule;
use crate::sync::error::DeployError;

/// A rule with its pattern compiled once per run.
#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: String,
    matcher: Result<GlobMatcher, String>,
    tags: BTreeMap<String, String>,
}

impl CompiledRule {
    fn is_match(&self, path: &str) -> Result<bool, DeployError> {
        match &self.matcher {
            Ok(matcher) => Ok(matcher.is_match(path)),
            Err(message) => Err(DeployError::RuleEvaluation {
                pattern: self.pattern.clone(),
                message: message.clone(),
            }),
        }
    }
}

/// An ordered list of compiled rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every pattern. A malformed pattern is kept as a failed rule so
    /// that evaluation can report it per file instead of failing here.
    pub fn compile(rules: &[SyncRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| CompiledRule {
                pattern: rule.pattern.clone(),
                matcher: compile_pattern(&rule.pattern),
                tags: rule.tags.clone(),
            })
            .collect();

        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Merge the tags of all rules matching `path`, in rule order. A later
    /// match overwrites an earlier one on key collision. Rules whose pattern
    /// cannot be evaluated are skipped with a warning.
    pub fn evaluate(&self, path: &str) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();

        for rule in &self.rules {
            match rule.is_match(path) {
                Ok(true) => {
                    merged.extend(rule.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                Ok(false) => {}
                Err(err) => {
                    log::warn!("Skipping rule for {}: {}", path, err);
                }
            }
        }

        merged
    }
}

/// One-shot helper: compile `rules` and evaluate them against `path`.
pub fn apply_rules(path: &str, rules: &[SyncRule]) -> BTreeMap<String, String> {
    RuleSet::compile(rules).evaluate(path)
}

// `*` stays within one path segment; `**` crosses directories.
fn compile_pattern(pattern: &str) -> Result<GlobMatcher, String> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| e.to_string())
}
