//! Boolean query DSL in the search engine's JSON shape.
//!
//! `match`, `match_phrase_prefix`, `bool`, `match_all`, plus the `query`,
//! `boost`, `fuzziness` and `operator` keys are part of the wire contract
//! with the search backend and are emitted exactly as the backend expects.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fuzziness {
    Auto,
    Edits(u8),
}

impl Serialize for Fuzziness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Fuzziness::Auto => serializer.serialize_str("AUTO"),
            Fuzziness::Edits(n) => serializer.serialize_u8(*n),
        }
    }
}

/// One field/text pair of a `match` or `match_phrase_prefix` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub field: String,
    pub query: String,
    pub boost: Option<f64>,
    pub fuzziness: Option<Fuzziness>,
    pub operator: Option<Operator>,
}

impl MatchClause {
    pub fn new(field: impl Into<String>, query: impl Into<String>) -> Self {
        Self { field: field.into(), query: query.into(), boost: None, fuzziness: None, operator: None }
    }

    pub fn boost(mut self, boost: f64) -> Self {
        self.boost = Some(boost);
        self
    }

    pub fn fuzziness(mut self, fuzziness: Fuzziness) -> Self {
        self.fuzziness = Some(fuzziness);
        self
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<QueryNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<QueryNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Match(MatchClause),
    MatchPhrasePrefix(MatchClause),
    Bool(BoolQuery),
    MatchAll,
}

impl QueryNode {
    pub fn matching(clause: MatchClause) -> Self {
        QueryNode::Match(clause)
    }

    pub fn prefix(clause: MatchClause) -> Self {
        QueryNode::MatchPhrasePrefix(clause)
    }

    /// `{"bool": {"should": [...]}}`: at least one alternative must match.
    pub fn any_of(alternatives: Vec<QueryNode>) -> Self {
        QueryNode::Bool(BoolQuery { must: Vec::new(), should: alternatives })
    }

    /// `{"bool": {"must": [...]}}`: every part must match.
    pub fn all_of(parts: Vec<QueryNode>) -> Self {
        QueryNode::Bool(BoolQuery { must: parts, should: Vec::new() })
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Serialize)]
struct MatchBody<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    boost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fuzziness: Option<Fuzziness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operator: Option<Operator>,
}

struct FieldEntry<'a>(&'a MatchClause);

impl Serialize for FieldEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let clause = self.0;
        let body = MatchBody {
            query: &clause.query,
            boost: clause.boost,
            fuzziness: clause.fuzziness,
            operator: clause.operator,
        };
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&clause.field, &body)?;
        map.end()
    }
}

struct EmptyObject;

impl Serialize for EmptyObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

impl Serialize for QueryNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            QueryNode::Match(clause) => map.serialize_entry("match", &FieldEntry(clause))?,
            QueryNode::MatchPhrasePrefix(clause) => {
                map.serialize_entry("match_phrase_prefix", &FieldEntry(clause))?
            }
            QueryNode::Bool(bool_query) => map.serialize_entry("bool", bool_query)?,
            QueryNode::MatchAll => map.serialize_entry("match_all", &EmptyObject)?,
        }
        map.end()
    }
}

/// Output of one rule: ranking clauses plus an optional required clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryFragment {
    pub should: Vec<QueryNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must: Option<QueryNode>,
}

impl QueryFragment {
    pub fn is_empty(&self) -> bool {
        self.should.is_empty() && self.must.is_none()
    }
}

/// Merged fragments of every active rule for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeQuery {
    pub should: Vec<QueryNode>,
    pub must: QueryNode,
}

impl Default for CompositeQuery {
    fn default() -> Self {
        Self { should: Vec::new(), must: QueryNode::MatchAll }
    }
}

impl CompositeQuery {
    /// `should` lists are concatenated in order. `must` is `match_all` when
    /// no fragment requires anything, the single required clause when one
    /// does, and the conjunction of all of them otherwise.
    pub fn merge<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = QueryFragment>,
    {
        let mut should = Vec::new();
        let mut required = Vec::new();
        for fragment in fragments {
            should.extend(fragment.should);
            required.extend(fragment.must);
        }
        let must = match required.len() {
            0 => QueryNode::MatchAll,
            1 => required.remove(0),
            _ => QueryNode::all_of(required),
        };
        Self { should, must }
    }

    pub fn is_match_all(&self) -> bool {
        self.should.is_empty() && self.must == QueryNode::MatchAll
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Request body for the backend's `_search` endpoint.
    pub fn to_search_body(&self, from: usize, size: usize) -> Value {
        serde_json::json!({
            "query": { "bool": { "should": self.should, "must": self.must } },
            "from": from,
            "size": size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn match_clause_shape() {
        let node = QueryNode::matching(MatchClause::new("article", "abc").boost(5.0));
        assert_eq!(node.to_json(), json!({"match": {"article": {"query": "abc", "boost": 5.0}}}));
    }

    #[test]
    fn optional_keys_are_omitted() {
        let node = QueryNode::matching(MatchClause::new("oem", "abc"));
        assert_eq!(node.to_json(), json!({"match": {"oem": {"query": "abc"}}}));
        let fuzzy = QueryNode::matching(
            MatchClause::new("name", "brake").fuzziness(Fuzziness::Auto).operator(Operator::And),
        );
        assert_eq!(
            fuzzy.to_json(),
            json!({"match": {"name": {"query": "brake", "fuzziness": "AUTO", "operator": "and"}}})
        );
    }

    #[test]
    fn match_all_is_empty_object() {
        assert_eq!(QueryNode::MatchAll.to_json(), json!({"match_all": {}}));
    }

    #[test]
    fn search_body_wraps_bool() {
        let body = CompositeQuery::default().to_search_body(0, 10);
        assert_eq!(
            body,
            json!({"query": {"bool": {"should": [], "must": {"match_all": {}}}}, "from": 0, "size": 10})
        );
    }
}
