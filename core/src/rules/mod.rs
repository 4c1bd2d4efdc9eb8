//! Search rules: each turns the normalized user query into one
//! `{should, must}` fragment with its own matching strategy and fields.

use crate::boost::BoostTable;
use crate::normalize::normalize_search_string;
use crate::query::QueryFragment;
use crate::sink::{FragmentRecord, FragmentSink};
use crate::{CatalogError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

mod full_match;
mod fuzzy_match;
mod partial_match;
mod prefix_match;
mod synonym;

pub use full_match::FullMatchRule;
pub use fuzzy_match::FuzzyMatchRule;
pub use partial_match::PartialMatchRule;
pub use prefix_match::PrefixMatchRule;
pub use synonym::{SynonymRule, SynonymTable};

/// Query text after [`normalize_search_string`]. Only constructible by
/// normalizing, so every holder sees the canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn new(raw: &str) -> Self {
        NormalizedQuery(normalize_search_string(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|t| !t.is_empty())
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait SearchRule: Send + Sync {
    /// Stable identifier used in configuration and logs.
    fn name(&self) -> &str;

    /// Pure: reads only its arguments. An empty query yields an empty fragment.
    fn build_fragment(&self, query: &NormalizedQuery, boosts: &BoostTable) -> QueryFragment;

    fn log_fragment(&self, fragment: &QueryFragment, sink: &dyn FragmentSink) {
        if let Err(err) = sink.record(FragmentRecord::new(self.name(), fragment.clone())) {
            tracing::warn!(rule = self.name(), error = %err, "query fragment not recorded");
        }
    }
}

/// Rules by identifier, in registration order.
#[derive(Default, Clone)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn SearchRule>>,
    by_name: HashMap<String, usize>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in rule; `synonyms` feeds the `Synonym` rule.
    pub fn standard(synonyms: SynonymTable) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FullMatchRule));
        registry.register(Arc::new(PartialMatchRule));
        registry.register(Arc::new(FuzzyMatchRule));
        registry.register(Arc::new(PrefixMatchRule));
        registry.register(Arc::new(SynonymRule::new(synonyms)));
        registry
    }

    /// Replaces an already registered rule of the same name.
    pub fn register(&mut self, rule: Arc<dyn SearchRule>) {
        let name = rule.name().to_string();
        match self.by_name.get(&name) {
            Some(&idx) => self.rules[idx] = rule,
            None => {
                self.by_name.insert(name, self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SearchRule>> {
        self.by_name.get(name).map(|&idx| Arc::clone(&self.rules[idx]))
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Looks up `names` keeping their order.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn SearchRule>>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).ok_or_else(|| CatalogError::UnknownRule(name.to_string()))
            })
            .collect()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry").field("rules", &self.names()).finish()
    }
}
