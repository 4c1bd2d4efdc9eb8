use crate::boost::BoostTable;
use crate::composer::{ComposeMode, RuleSetComposer};
use crate::rules::{RuleRegistry, SynonymTable};
use crate::sink::FragmentSink;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Search tuning, read from a JSON file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Overlaid on the default weights; fields left out keep theirs.
    #[serde(deserialize_with = "overlay_default_boosts")]
    pub boosts: BoostTable,
    /// Rule name → boosts overlaid on `boosts` for that rule only.
    pub rule_boosts: BTreeMap<String, BoostTable>,
    /// Rules applied when a request does not name any.
    pub rules: Vec<String>,
    pub mode: ComposeMode,
    pub synonyms: SynonymTable,
    pub page_size: usize,
}

fn default_boosts() -> BoostTable {
    [
        ("article", 10.0),
        ("oem", 7.0),
        ("article_text_clean", 5.0),
        ("name", 3.0),
        ("description", 1.0),
    ]
    .into_iter()
    .collect()
}

fn overlay_default_boosts<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<BoostTable, D::Error> {
    let file = BoostTable::deserialize(deserializer)?;
    Ok(default_boosts().overlay(&file))
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            boosts: default_boosts(),
            rule_boosts: BTreeMap::new(),
            rules: vec!["FullMatch".to_string()],
            mode: ComposeMode::Merge,
            synonyms: SynonymTable::default(),
            page_size: 20,
        }
    }
}

impl SearchConfig {
    /// Defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading search config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing search config {}", path.display()))?
            }
            None => SearchConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.boosts.validate()?;
        let registry = self.registry();
        registry.resolve(&self.rules)?;
        for (rule, boosts) in &self.rule_boosts {
            registry.resolve(std::slice::from_ref(rule))?;
            boosts.validate()?;
        }
        if self.page_size == 0 {
            anyhow::bail!("page_size must be positive");
        }
        Ok(())
    }

    pub fn registry(&self) -> RuleRegistry {
        RuleRegistry::standard(self.synonyms.clone())
    }

    pub fn composer(&self, sink: Arc<dyn FragmentSink>) -> RuleSetComposer {
        self.rule_boosts
            .iter()
            .fold(RuleSetComposer::new(sink), |composer, (rule, boosts)| {
                composer.with_rule_boosts(rule.clone(), boosts.clone())
            })
    }
}
