use crate::boost::BoostTable;
use crate::query::{CompositeQuery, QueryFragment};
use crate::rules::{NormalizedQuery, SearchRule};
use crate::sink::{FragmentSink, TracingSink};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeMode {
    /// All rules merged into one query.
    #[default]
    Merge,
    /// One query per rule, tried in order until one has hits.
    Cascade,
}

/// Composite built from a single rule, as used by [`ComposeMode::Cascade`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleQuery {
    pub rule: String,
    pub query: CompositeQuery,
}

/// Runs a rule set against one query and merges the fragments.
///
/// Holds no per-request state; the query and boosts are passed to every
/// call, so one composer serves concurrent requests.
pub struct RuleSetComposer {
    sink: Arc<dyn FragmentSink>,
    rule_boosts: HashMap<String, BoostTable>,
}

impl Default for RuleSetComposer {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink::default()))
    }
}

impl RuleSetComposer {
    pub fn new(sink: Arc<dyn FragmentSink>) -> Self {
        Self { sink, rule_boosts: HashMap::new() }
    }

    /// Per-rule overlay on top of the global boost table.
    pub fn with_rule_boosts(mut self, rule: impl Into<String>, boosts: BoostTable) -> Self {
        self.rule_boosts.insert(rule.into(), boosts);
        self
    }

    pub fn boosts_for<'a>(&self, rule: &str, global: &'a BoostTable) -> Cow<'a, BoostTable> {
        match self.rule_boosts.get(rule) {
            Some(shard) => Cow::Owned(global.overlay(shard)),
            None => Cow::Borrowed(global),
        }
    }

    /// Normalizes `raw` once and merges every rule's fragment.
    pub fn compose(&self, raw: &str, rules: &[Arc<dyn SearchRule>], boosts: &BoostTable) -> CompositeQuery {
        self.compose_normalized(&NormalizedQuery::new(raw), rules, boosts)
    }

    /// An empty rule set yields the match-all composite.
    pub fn compose_normalized(
        &self,
        query: &NormalizedQuery,
        rules: &[Arc<dyn SearchRule>],
        boosts: &BoostTable,
    ) -> CompositeQuery {
        let fragments: Vec<QueryFragment> =
            rules.iter().map(|rule| self.run_rule(rule.as_ref(), query, boosts)).collect();
        CompositeQuery::merge(fragments)
    }

    /// One stand-alone composite per rule, in rule order.
    pub fn cascade(&self, raw: &str, rules: &[Arc<dyn SearchRule>], boosts: &BoostTable) -> Vec<RuleQuery> {
        self.cascade_normalized(&NormalizedQuery::new(raw), rules, boosts)
    }

    pub fn cascade_normalized(
        &self,
        query: &NormalizedQuery,
        rules: &[Arc<dyn SearchRule>],
        boosts: &BoostTable,
    ) -> Vec<RuleQuery> {
        rules
            .iter()
            .map(|rule| RuleQuery {
                rule: rule.name().to_string(),
                query: CompositeQuery::merge([self.run_rule(rule.as_ref(), query, boosts)]),
            })
            .collect()
    }

    fn run_rule(&self, rule: &dyn SearchRule, query: &NormalizedQuery, boosts: &BoostTable) -> QueryFragment {
        let boosts = self.boosts_for(rule.name(), boosts);
        let fragment = rule.build_fragment(query, &boosts);
        rule.log_fragment(&fragment, self.sink.as_ref());
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FullMatchRule;

    #[test]
    fn rule_overlay_changes_only_that_rule() {
        let composer = RuleSetComposer::default()
            .with_rule_boosts("FullMatch", BoostTable::new().with("oem", 42.0));
        let global = BoostTable::new().with("oem", 1.5);
        assert_eq!(composer.boosts_for("FullMatch", &global).weight("oem"), 42.0);
        assert_eq!(composer.boosts_for("PrefixMatch", &global).weight("oem"), 1.5);
    }

    #[test]
    fn cascade_keeps_rules_apart() {
        let rules: Vec<Arc<dyn SearchRule>> = vec![Arc::new(FullMatchRule), Arc::new(FullMatchRule)];
        let plans = RuleSetComposer::default().cascade("x1", &rules, &BoostTable::new());
        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.rule == "FullMatch" && p.query.should.len() == 2));
    }
}
