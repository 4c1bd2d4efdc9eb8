use crate::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight applied to a field the table has no (valid) entry for.
pub const DEFAULT_BOOST: f64 = 1.0;

/// Field name → boost weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoostTable(BTreeMap<String, f64>);

impl BoostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, weight: f64) -> Self {
        self.0.insert(field.into(), weight);
        self
    }

    /// Boost for `field`. Missing, non-finite or non-positive entries
    /// resolve to [`DEFAULT_BOOST`].
    pub fn weight(&self, field: &str) -> f64 {
        match self.0.get(field) {
            Some(w) if w.is_finite() && *w > 0.0 => *w,
            _ => DEFAULT_BOOST,
        }
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries of `other` win over entries of `self`.
    pub fn overlay(&self, other: &BoostTable) -> BoostTable {
        let mut merged = self.0.clone();
        merged.extend(other.0.iter().map(|(k, v)| (k.clone(), *v)));
        BoostTable(merged)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in &self.0 {
            if !value.is_finite() || *value <= 0.0 {
                return Err(CatalogError::InvalidBoost { field: field.clone(), value: *value });
            }
        }
        Ok(())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for BoostTable {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        BoostTable(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_invalid_fall_back_to_default() {
        let table = BoostTable::new().with("article", 5.0).with("oem", -2.0);
        assert_eq!(table.weight("article"), 5.0);
        assert_eq!(table.weight("oem"), DEFAULT_BOOST);
        assert_eq!(table.weight("name"), DEFAULT_BOOST);
        assert!(table.validate().is_err());
    }

    #[test]
    fn overlay_prefers_other() {
        let base: BoostTable = [("article", 5.0), ("oem", 3.0)].into_iter().collect();
        let shard: BoostTable = [("oem", 9.0)].into_iter().collect();
        let merged = base.overlay(&shard);
        assert_eq!(merged.weight("article"), 5.0);
        assert_eq!(merged.weight("oem"), 9.0);
    }
}
