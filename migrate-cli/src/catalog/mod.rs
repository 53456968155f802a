mod plan;

pub use plan::{builtin_plan, builtin_plans, AuditSpec, MigrationPlan, PlanSection, RuleSpec};

use regex::{NoExpand, Regex, RegexBuilder};
use serde::Serialize;

use crate::core::MigrateError;

/// A single find-and-replace rule
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    /// Human readable name (falls back to the pattern)
    label: String,

    /// Compiled match pattern
    pattern: Regex,

    /// Replacement text
    replacement: String,

    /// Expand `$1` / `${name}` capture references in the replacement
    expand: bool,
}

impl SubstitutionRule {
    /// Create a rule with a literal replacement
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, MigrateError> {
        Self::from_spec(&RuleSpec {
            label: None,
            pattern: pattern.to_string(),
            replacement: replacement.into(),
            dotall: false,
            expand: false,
        })
    }

    /// Compile a rule from its configuration form
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, MigrateError> {
        let label = spec
            .label
            .clone()
            .unwrap_or_else(|| spec.pattern.clone());

        let pattern = RegexBuilder::new(&spec.pattern)
            .dot_matches_new_line(spec.dotall)
            .build()
            .map_err(|source| MigrateError::InvalidPattern {
                rule: label.clone(),
                source,
            })?;

        Ok(Self {
            label,
            pattern,
            replacement: spec.replacement.clone(),
            expand: spec.expand,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replace every match in `text`. Returns `None` when nothing matched.
    fn apply(&self, text: &str) -> Option<(String, RuleHit)> {
        let first = self.pattern.find(text)?;
        let matches = self.pattern.find_iter(text).count();

        let replaced = if self.expand {
            self.pattern.replace_all(text, self.replacement.as_str())
        } else {
            self.pattern.replace_all(text, NoExpand(&self.replacement))
        };

        let hit = RuleHit {
            rule: self.label.clone(),
            matches,
            first_match: first.as_str().to_string(),
            replacement: self.replacement.clone(),
        };

        Some((replaced.into_owned(), hit))
    }
}

/// Record of a rule that matched while rewriting a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    /// Label of the rule
    pub rule: String,

    /// Number of matches replaced
    pub matches: usize,

    /// First matched text (for the report)
    pub first_match: String,

    /// Replacement text
    pub replacement: String,
}

/// Ordered list of rules applied as a sequential composition
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: Vec<SubstitutionRule>,
}

impl RuleCatalog {
    pub fn new(rules: Vec<SubstitutionRule>) -> Self {
        Self { rules }
    }

    /// Compile a catalog from its configuration form, failing on the first bad pattern
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self, MigrateError> {
        let rules = specs
            .iter()
            .map(SubstitutionRule::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[SubstitutionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order. Each rule sees the output of the previous one.
    pub fn apply(&self, text: &str) -> (String, Vec<RuleHit>) {
        let mut current = text.to_string();
        let mut hits = Vec::new();

        for rule in &self.rules {
            if let Some((replaced, hit)) = rule.apply(&current) {
                current = replaced;
                hits.push(hit);
            }
        }

        (current, hits)
    }
}
