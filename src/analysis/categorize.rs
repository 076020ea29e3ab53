//! Prefix-based metric categorization.
//!
//! Metric tags follow `<prefix>/<bare_name>`. A [`PrefixPolicy`] decides which
//! prefixes are tracked and which category each one feeds.

use crate::error::{Result, SummaryError};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Category name to bare metric name to value.
pub type Categorized = Vec<(String, BTreeMap<String, f64>)>;

/// How metric prefixes map to output categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixPolicy {
    /// Each prefix is its own category.
    PrefixSet(Vec<String>),
    /// Explicit prefix to category pairs, in declaration order.
    PrefixToCategory(Vec<(String, String)>),
}

impl PrefixPolicy {
    /// Resolve a policy from a loosely typed config value.
    ///
    /// Sequences of strings become [`PrefixPolicy::PrefixSet`], string-to-string
    /// mappings become [`PrefixPolicy::PrefixToCategory`]. Anything else is rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Sequence(items) => items
                .iter()
                .map(scalar_string)
                .collect::<Option<Vec<_>>>()
                .map(PrefixPolicy::PrefixSet)
                .ok_or_else(|| {
                    SummaryError::InvalidPrefixPolicy("list entries must be strings".to_string())
                }),
            Value::Mapping(mapping) => mapping
                .iter()
                .map(|(k, v)| Some((scalar_string(k)?, scalar_string(v)?)))
                .collect::<Option<Vec<_>>>()
                .map(PrefixPolicy::PrefixToCategory)
                .ok_or_else(|| {
                    SummaryError::InvalidPrefixPolicy(
                        "mapping keys and values must be strings".to_string(),
                    )
                }),
            other => Err(SummaryError::InvalidPrefixPolicy(format!(
                "unsupported value {:?}",
                other
            ))),
        }
    }

    /// Prefix to category pairs in declaration order.
    fn pairs(&self) -> Vec<(&str, &str)> {
        match self {
            PrefixPolicy::PrefixSet(prefixes) => {
                prefixes.iter().map(|p| (p.as_str(), p.as_str())).collect()
            }
            PrefixPolicy::PrefixToCategory(pairs) => pairs
                .iter()
                .map(|(p, c)| (p.as_str(), c.as_str()))
                .collect(),
        }
    }

    /// Declared categories, first occurrence order, without duplicates.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for (_, category) in self.pairs() {
            if !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
        categories
    }

    /// Partition metrics into categories, stripping `<prefix>/`.
    ///
    /// Every declared category is present in the output. Unmatched metrics are
    /// dropped. When two prefixes produce the same bare name in one category,
    /// the prefix declared last wins.
    pub fn categorize(&self, metrics: &BTreeMap<String, f64>) -> Categorized {
        let mut categorized: Categorized = self
            .categories()
            .into_iter()
            .map(|c| (c, BTreeMap::new()))
            .collect();

        for (prefix, category) in self.pairs() {
            let marker = format!("{}/", prefix);
            let Some((_, bucket)) = categorized.iter_mut().find(|(c, _)| c == category) else {
                continue;
            };
            for (name, value) in metrics {
                if let Some(bare) = name.strip_prefix(&marker) {
                    bucket.insert(bare.to_string(), *value);
                }
            }
        }

        categorized
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
