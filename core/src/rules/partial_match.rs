use super::{NormalizedQuery, SearchRule};
use crate::boost::BoostTable;
use crate::query::{MatchClause, Operator, QueryFragment, QueryNode};

/// Every query word has to appear in the name or in the description.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartialMatchRule;

impl SearchRule for PartialMatchRule {
    fn name(&self) -> &str {
        "PartialMatch"
    }

    fn build_fragment(&self, query: &NormalizedQuery, boosts: &BoostTable) -> QueryFragment {
        if query.is_empty() {
            return QueryFragment::default();
        }
        let q = query.as_str();
        let should = vec![
            QueryNode::matching(
                MatchClause::new("name", q).operator(Operator::And).boost(boosts.weight("name")),
            ),
            QueryNode::matching(MatchClause::new("description", q).boost(boosts.weight("description"))),
        ];
        let must = QueryNode::any_of(vec![
            QueryNode::matching(MatchClause::new("name", q).operator(Operator::And)),
            QueryNode::matching(MatchClause::new("description", q).operator(Operator::And)),
        ]);
        QueryFragment { should, must: Some(must) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_and_description_need_every_word() {
        let boosts = BoostTable::new().with("name", 3.0).with("description", 1.5);
        let fragment = PartialMatchRule.build_fragment(&NormalizedQuery::new("Front  PADS"), &boosts);
        let should: Vec<_> = fragment.should.iter().map(QueryNode::to_json).collect();
        assert_eq!(
            should,
            vec![
                json!({"match": {"name": {"query": "front pads", "boost": 3.0, "operator": "and"}}}),
                json!({"match": {"description": {"query": "front pads", "boost": 1.5}}}),
            ]
        );
        assert_eq!(
            fragment.must.map(|m| m.to_json()),
            Some(json!({"bool": {"should": [
                {"match": {"name": {"query": "front pads", "operator": "and"}}},
                {"match": {"description": {"query": "front pads", "operator": "and"}}}
            ]}}))
        );
    }

    #[test]
    fn empty_query_gives_empty_fragment() {
        let fragment = PartialMatchRule.build_fragment(&NormalizedQuery::new(" ;; "), &BoostTable::new());
        assert!(fragment.is_empty());
    }
}
