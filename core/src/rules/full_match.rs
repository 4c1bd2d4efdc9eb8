use super::{NormalizedQuery, SearchRule};
use crate::boost::BoostTable;
use crate::query::{MatchClause, QueryFragment, QueryNode};

/// Exact match on the product codes.
///
/// Ranks by `article` and `oem` with their configured boosts and requires
/// the text to match either `oem` or `article_text_clean`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullMatchRule;

impl SearchRule for FullMatchRule {
    fn name(&self) -> &str {
        "FullMatch"
    }

    fn build_fragment(&self, query: &NormalizedQuery, boosts: &BoostTable) -> QueryFragment {
        if query.is_empty() {
            return QueryFragment::default();
        }
        let q = query.as_str();
        let should = vec![
            QueryNode::matching(MatchClause::new("article", q).boost(boosts.weight("article"))),
            QueryNode::matching(MatchClause::new("oem", q).boost(boosts.weight("oem"))),
        ];
        let must = QueryNode::any_of(vec![
            QueryNode::matching(MatchClause::new("oem", q)),
            QueryNode::matching(MatchClause::new("article_text_clean", q)),
        ]);
        QueryFragment { should, must: Some(must) }
    }
}
