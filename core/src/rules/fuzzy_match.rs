use super::{NormalizedQuery, SearchRule};
use crate::boost::BoostTable;
use crate::normalize::compact_code;
use crate::query::{Fuzziness, MatchClause, QueryFragment, QueryNode};

/// Tolerates typos in the name and in the separator-free article.
#[derive(Debug, Default, Clone, Copy)]
pub struct FuzzyMatchRule;

impl SearchRule for FuzzyMatchRule {
    fn name(&self) -> &str {
        "FuzzyMatch"
    }

    fn build_fragment(&self, query: &NormalizedQuery, boosts: &BoostTable) -> QueryFragment {
        if query.is_empty() {
            return QueryFragment::default();
        }
        let q = query.as_str();
        let code = compact_code(q);
        let should = vec![
            QueryNode::matching(
                MatchClause::new("name", q).fuzziness(Fuzziness::Auto).boost(boosts.weight("name")),
            ),
            QueryNode::matching(
                MatchClause::new("article_text_clean", code.as_str())
                    .fuzziness(Fuzziness::Auto)
                    .boost(boosts.weight("article_text_clean")),
            ),
        ];
        let must = QueryNode::any_of(vec![
            QueryNode::matching(MatchClause::new("name", q).fuzziness(Fuzziness::Auto)),
            QueryNode::matching(MatchClause::new("article_text_clean", code).fuzziness(Fuzziness::Auto)),
        ]);
        QueryFragment { should, must: Some(must) }
    }
}
