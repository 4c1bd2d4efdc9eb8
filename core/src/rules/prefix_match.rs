use super::{NormalizedQuery, SearchRule};
use crate::boost::BoostTable;
use crate::normalize::compact_code;
use crate::query::{MatchClause, QueryFragment, QueryNode};

/// Incomplete codes: the query is treated as the beginning of an article or OEM number.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrefixMatchRule;

impl SearchRule for PrefixMatchRule {
    fn name(&self) -> &str {
        "PrefixMatch"
    }

    fn build_fragment(&self, query: &NormalizedQuery, boosts: &BoostTable) -> QueryFragment {
        if query.is_empty() {
            return QueryFragment::default();
        }
        let q = query.as_str();
        let code = compact_code(q);
        let should = vec![
            QueryNode::prefix(MatchClause::new("article", q).boost(boosts.weight("article"))),
            QueryNode::prefix(
                MatchClause::new("article_text_clean", code.as_str())
                    .boost(boosts.weight("article_text_clean")),
            ),
        ];
        let must = QueryNode::any_of(vec![
            QueryNode::prefix(MatchClause::new("article_text_clean", code)),
            QueryNode::prefix(MatchClause::new("oem", q)),
        ]);
        QueryFragment { should, must: Some(must) }
    }
}
