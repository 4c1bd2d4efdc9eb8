use catalog_core::boost::BoostTable;
use catalog_core::composer::RuleSetComposer;
use catalog_core::query::{CompositeQuery, MatchClause, QueryFragment, QueryNode};
use catalog_core::rules::{FullMatchRule, NormalizedQuery, RuleRegistry, SearchRule, SynonymTable};
use catalog_core::sink::{FragmentRecord, FragmentSink, RingSink, SinkError};
use serde_json::json;
use std::sync::Arc;

/// Emits one should clause and one required clause on its own field.
struct FieldRule {
    name: &'static str,
    field: &'static str,
}

impl SearchRule for FieldRule {
    fn name(&self) -> &str {
        self.name
    }

    fn build_fragment(&self, query: &NormalizedQuery, _boosts: &BoostTable) -> QueryFragment {
        QueryFragment {
            should: vec![QueryNode::matching(MatchClause::new(self.field, query.as_str()))],
            must: Some(QueryNode::matching(MatchClause::new(format!("{}_req", self.field), query.as_str()))),
        }
    }
}

struct BrokenSink;

impl FragmentSink for BrokenSink {
    fn record(&self, _record: FragmentRecord) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("disk full".into()))
    }
}

fn boosts(article: f64, oem: f64) -> BoostTable {
    BoostTable::new().with("article", article).with("oem", oem)
}

fn should_json(fragment: &QueryFragment) -> Vec<serde_json::Value> {
    fragment.should.iter().map(QueryNode::to_json).collect()
}

#[test]
fn full_match_propagates_boosts() {
    let fragment = FullMatchRule.build_fragment(&NormalizedQuery::new("ABC-123"), &boosts(5.0, 3.0));
    let should = should_json(&fragment);
    assert!(should.contains(&json!({"match": {"article": {"query": "abc-123", "boost": 5.0}}})));
    assert!(should.contains(&json!({"match": {"oem": {"query": "abc-123", "boost": 3.0}}})));
}

#[test]
fn building_twice_is_byte_identical() {
    let registry = RuleRegistry::standard(
        SynonymTable::try_from(std::collections::BTreeMap::from([("pad".to_string(), vec!["pads".to_string()])])).unwrap(),
    );
    let query = NormalizedQuery::new("Brake PAD 0986-494");
    let table = boosts(10.0, 7.0);
    for name in registry.names() {
        let rule = registry.get(name).unwrap();
        let a = serde_json::to_string(&rule.build_fragment(&query, &table)).unwrap();
        let b = serde_json::to_string(&rule.build_fragment(&query, &table)).unwrap();
        assert_eq!(a, b, "rule {name}");
    }
}

#[test]
fn end_to_end_example() {
    let rules: Vec<Arc<dyn SearchRule>> = vec![Arc::new(FullMatchRule)];
    let composite = RuleSetComposer::default().compose("  oem-99 AB ", &rules, &boosts(10.0, 7.0));
    assert_eq!(
        composite.to_json(),
        json!({
            "should": [
                {"match": {"article": {"query": "oem-99 ab", "boost": 10.0}}},
                {"match": {"oem": {"query": "oem-99 ab", "boost": 7.0}}}
            ],
            "must": {"bool": {"should": [
                {"match": {"oem": {"query": "oem-99 ab"}}},
                {"match": {"article_text_clean": {"query": "oem-99 ab"}}}
            ]}}
        })
    );
}

#[test]
fn merge_keeps_order_and_ands_required_clauses() {
    let rules: Vec<Arc<dyn SearchRule>> = vec![
        Arc::new(FieldRule { name: "R1", field: "a" }),
        Arc::new(FieldRule { name: "R2", field: "b" }),
    ];
    let composite = RuleSetComposer::default().compose("q", &rules, &BoostTable::new());
    assert_eq!(
        composite.to_json(),
        json!({
            "should": [{"match": {"a": {"query": "q"}}}, {"match": {"b": {"query": "q"}}}],
            "must": {"bool": {"must": [
                {"match": {"a_req": {"query": "q"}}},
                {"match": {"b_req": {"query": "q"}}}
            ]}}
        })
    );
}

#[test]
fn single_required_clause_is_not_wrapped() {
    let fragment = QueryFragment {
        should: vec![],
        must: Some(QueryNode::matching(MatchClause::new("oem", "x"))),
    };
    let composite = CompositeQuery::merge([fragment, QueryFragment::default()]);
    assert_eq!(composite.must.to_json(), json!({"match": {"oem": {"query": "x"}}}));
}

#[test]
fn empty_rule_set_matches_everything() {
    let composite = RuleSetComposer::default().compose("anything", &[], &BoostTable::new());
    assert!(composite.should.is_empty());
    assert_eq!(composite.must, QueryNode::MatchAll);
    assert!(composite.is_match_all());
}

#[test]
fn empty_query_degrades_to_match_all() {
    let registry = RuleRegistry::standard(SynonymTable::default());
    let rules = registry.resolve(&registry.names()).unwrap();
    let composite = RuleSetComposer::default().compose(" ?! ", &rules, &BoostTable::new());
    assert!(composite.is_match_all());
}

#[test]
fn every_rule_sees_the_same_normalization() {
    let ring = Arc::new(RingSink::new(16));
    let composer = RuleSetComposer::new(ring.clone());
    let rules: Vec<Arc<dyn SearchRule>> = vec![
        Arc::new(FieldRule { name: "R1", field: "a" }),
        Arc::new(FieldRule { name: "R2", field: "b" }),
    ];
    composer.compose("  MiXeD  Case ", &rules, &BoostTable::new());
    let records = ring.recent();
    assert_eq!(records.iter().map(|r| r.rule.as_str()).collect::<Vec<_>>(), vec!["R1", "R2"]);
    for record in records {
        let json = serde_json::to_value(&record.fragment).unwrap();
        let text = json["should"][0]["match"].as_object().unwrap().values().next().unwrap()["query"].clone();
        assert_eq!(text, json!("mixed case"));
    }
}

#[test]
fn failing_sink_does_not_affect_the_query() {
    let rules: Vec<Arc<dyn SearchRule>> = vec![Arc::new(FullMatchRule)];
    let table = boosts(10.0, 7.0);
    let with_broken = RuleSetComposer::new(Arc::new(BrokenSink)).compose("abc", &rules, &table);
    let with_default = RuleSetComposer::default().compose("abc", &rules, &table);
    assert_eq!(with_broken, with_default);
}

#[test]
fn missing_boost_uses_default_weight() {
    let fragment = FullMatchRule.build_fragment(&NormalizedQuery::new("abc"), &BoostTable::new());
    assert_eq!(
        should_json(&fragment)[0],
        json!({"match": {"article": {"query": "abc", "boost": catalog_core::boost::DEFAULT_BOOST}}})
    );
}
