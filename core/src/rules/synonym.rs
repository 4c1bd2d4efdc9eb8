use super::{NormalizedQuery, SearchRule};
use crate::boost::BoostTable;
use crate::normalize::normalize_search_string;
use crate::query::{MatchClause, QueryFragment, QueryNode};
use serde::{Deserialize, Serialize};
use crate::{CatalogError, Result};
use std::collections::BTreeMap;

/// Term → alternative spellings. Keys and values are normalized on the
/// way in; terms whose every synonym normalizes away are dropped. Keys
/// must be single words, since lookups are per query token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct SynonymTable(BTreeMap<String, Vec<String>>);

impl SynonymTable {
    pub fn get(&self, term: &str) -> &[String] {
        self.0.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for SynonymTable {
    type Error = CatalogError;

    fn try_from(raw: BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut table = BTreeMap::new();
        for (term, synonyms) in raw {
            let term = normalize_search_string(&term);
            if term.is_empty() {
                continue;
            }
            if term.contains(' ') {
                return Err(CatalogError::InvalidInput(format!("synonym key `{term}` must be a single word")));
            }
            let entry: &mut Vec<String> = table.entry(term.clone()).or_default();
            for synonym in synonyms {
                let synonym = normalize_search_string(&synonym);
                if !synonym.is_empty() && synonym != term && !entry.contains(&synonym) {
                    entry.push(synonym);
                }
            }
        }
        table.retain(|_, synonyms| !synonyms.is_empty());
        Ok(SynonymTable(table))
    }
}

impl From<SynonymTable> for BTreeMap<String, Vec<String>> {
    fn from(table: SynonymTable) -> Self {
        table.0
    }
}

/// Re-runs the name match once per synonym of each query token. Ranking
/// only, never required.
#[derive(Debug, Clone, Default)]
pub struct SynonymRule {
    synonyms: SynonymTable,
}

impl SynonymRule {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }
}

impl SearchRule for SynonymRule {
    fn name(&self) -> &str {
        "Synonym"
    }

    fn build_fragment(&self, query: &NormalizedQuery, boosts: &BoostTable) -> QueryFragment {
        let tokens: Vec<&str> = query.tokens().collect();
        let boost = boosts.weight("name");
        let mut variants: Vec<String> = Vec::new();
        for (idx, token) in tokens.iter().enumerate() {
            for synonym in self.synonyms.get(token) {
                let mut words = tokens.clone();
                words[idx] = synonym.as_str();
                let variant = words.join(" ");
                if !variants.contains(&variant) {
                    variants.push(variant);
                }
            }
        }
        let should = variants
            .into_iter()
            .map(|variant| QueryNode::matching(MatchClause::new("name", variant).boost(boost)))
            .collect();
        QueryFragment { should, must: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    fn table() -> SynonymTable {
        SynonymTable::try_from(raw(&[("Колодки", &["pads", "КОЛОДКИ"]), ("filter", &["filtr", "element"])])).unwrap()
    }

    #[test]
    fn table_is_normalized() {
        let t = table();
        assert_eq!(t.get("колодки"), &["pads".to_string()]);
        assert!(t.get("Колодки").is_empty());
    }

    #[test]
    fn one_clause_per_synonym() {
        let rule = SynonymRule::new(table());
        let boosts = BoostTable::new().with("name", 2.0);
        let fragment = rule.build_fragment(&NormalizedQuery::new("oil FILTER"), &boosts);
        assert!(fragment.must.is_none());
        let clauses: Vec<_> = fragment.should.iter().map(QueryNode::to_json).collect();
        assert_eq!(
            clauses,
            vec![
                json!({"match": {"name": {"query": "oil filtr", "boost": 2.0}}}),
                json!({"match": {"name": {"query": "oil element", "boost": 2.0}}}),
            ]
        );
    }

    #[test]
    fn no_synonyms_no_clauses() {
        let rule = SynonymRule::new(table());
        assert!(rule.build_fragment(&NormalizedQuery::new("spark plug"), &BoostTable::new()).is_empty());
    }

    #[test]
    fn multi_word_keys_are_rejected() {
        let err = SynonymTable::try_from(raw(&[("Brake  Pad", &["pads"])])).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(msg) if msg.contains("brake pad")));
        let parsed: serde_json::Result<SynonymTable> = serde_json::from_str(r#"{"brake pad": ["pads"]}"#);
        assert!(parsed.is_err());
        let ok: SynonymTable = serde_json::from_str(r#"{"Pad": ["pads"]}"#).unwrap();
        assert_eq!(ok.get("pad"), &["pads".to_string()]);
    }
}
