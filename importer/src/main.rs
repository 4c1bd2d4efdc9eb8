use anyhow::{bail, Context, Result};
use catalog_core::composer::ComposeMode;
use catalog_core::config::SearchConfig;
use catalog_core::persist::CatalogStore;
use catalog_core::sink::TracingSink;
use catalog_core::{Brand, Category, NewProduct};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Products written per store transaction.
const BATCH_SIZE: usize = 500;

#[derive(Parser)]
#[command(name = "importer")]
#[command(about = "Load catalog data and inspect generated search queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Products,
    Categories,
    Brands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load JSON/JSONL records from a file or directory into the catalog
    Load {
        #[arg(long, value_enum)]
        kind: Kind,
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Catalog database directory
        #[arg(long, default_value = "./catalog-db")]
        db: PathBuf,
    },
    /// Print the search body generated for a query
    Explain {
        #[arg(long)]
        query: String,
        /// Search tuning file; built-in defaults when absent
        #[arg(long)]
        config: Option<PathBuf>,
        /// Comma-separated rule names, overriding the configured set
        #[arg(long, value_delimiter = ',')]
        rules: Option<Vec<String>>,
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Merge,
    Cascade,
}

impl From<Mode> for ComposeMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Merge => ComposeMode::Merge,
            Mode::Cascade => ComposeMode::Cascade,
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Load { kind, input, db } => load(kind, &input, &db),
        Commands::Explain { query, config, rules, mode } => explain(&query, config.as_deref(), rules, mode),
    }
}

fn load(kind: Kind, input: &Path, db: &Path) -> Result<()> {
    let store = CatalogStore::open(db).with_context(|| format!("opening catalog at {}", db.display()))?;
    let count = match kind {
        Kind::Products => load_products(&store, read_records(input)?, BATCH_SIZE)?,
        Kind::Categories => {
            let categories: Vec<Category> = read_records(input)?;
            for category in &categories {
                store.put_category(category)?;
            }
            categories.len()
        }
        Kind::Brands => {
            let brands: Vec<Brand> = read_records(input)?;
            for brand in &brands {
                store.put_brand(brand)?;
            }
            brands.len()
        }
    };
    store.flush()?;
    tracing::info!(?kind, count, db = %db.display(), "import complete");
    Ok(())
}

/// Every uuid is checked before the first batch is written, so a rejected
/// import stores nothing and can be re-run once the input is fixed.
fn load_products(store: &CatalogStore, products: Vec<NewProduct>, batch_size: usize) -> Result<usize> {
    let mut seen = HashSet::with_capacity(products.len());
    for product in &products {
        if !seen.insert(product.uuid.as_str()) {
            bail!("product `{}` appears more than once in the input", product.uuid);
        }
        if store.get_product(&product.uuid)?.is_some() {
            bail!("product `{}` already exists", product.uuid);
        }
    }
    let mut loaded = 0;
    for chunk in products.chunks(batch_size.max(1)) {
        loaded += store.insert_products(chunk.to_vec())?.len();
        tracing::debug!(loaded, "product batch stored");
    }
    Ok(loaded)
}

fn explain(query: &str, config: Option<&Path>, rules: Option<Vec<String>>, mode: Option<Mode>) -> Result<()> {
    let config = SearchConfig::load(config)?;
    let registry = config.registry();
    let rules = registry.resolve(rules.as_deref().unwrap_or(&config.rules))?;
    let composer = config.composer(Arc::new(TracingSink::default()));
    let output = match mode.map(ComposeMode::from).unwrap_or(config.mode) {
        ComposeMode::Merge => serde_json::to_value(composer.compose(query, &rules, &config.boosts))?,
        ComposeMode::Cascade => serde_json::to_value(composer.cascade(query, &rules, &config.boosts))?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Every `.json`/`.jsonl` file under `input`, in path order.
fn input_files(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")))
        .collect();
    files.sort();
    files
}

/// A `.json` file holds one object or an array, a `.jsonl` file one object per line.
fn read_records<T: DeserializeOwned>(input: &Path) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for file in input_files(input) {
        let reader = BufReader::new(File::open(&file).with_context(|| format!("reading {}", file.display()))?);
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            for (lineno, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let record = serde_json::from_str(&line)
                    .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
                out.push(record);
            }
        } else {
            let json: serde_json::Value = serde_json::from_reader(reader)?;
            match json {
                serde_json::Value::Array(items) => {
                    for item in items {
                        out.push(serde_json::from_value(item).with_context(|| file.display().to_string())?);
                    }
                }
                other => out.push(serde_json::from_value(other).with_context(|| file.display().to_string())?),
            }
        }
        tracing::debug!(file = %file.display(), total = out.len(), "records read");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_json_arrays_and_jsonl_lines() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"[{"uuid":"b1","name":"Bosch"},{"uuid":"b2","name":"ATE"}]"#).unwrap();
        fs::write(dir.path().join("b.jsonl"), "{\"uuid\":\"b3\",\"name\":\"TRW\"}\n\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let brands: Vec<Brand> = read_records(dir.path()).unwrap();
        let names: Vec<&str> = brands.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Bosch", "ATE", "TRW"]);
    }

    #[test]
    fn loaded_products_get_default_slugs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("products.jsonl");
        fs::write(&input, "{\"uuid\":\"p1\",\"name\":\"Pad\"}\n{\"uuid\":\"p2\",\"name\":\"Disc\",\"url_slug\":\"disc\"}\n").unwrap();
        let db = dir.path().join("db");
        load(Kind::Products, &input, &db).unwrap();
        let store = CatalogStore::open(&db).unwrap();
        assert_eq!(store.get_product("p1").unwrap().unwrap().url_slug, "p1");
        assert_eq!(store.get_product("p2").unwrap().unwrap().url_slug, "disc");
    }

    #[test]
    fn conflicting_import_stores_nothing() {
        let store = CatalogStore::temporary().unwrap();
        let product = |uuid: &str| NewProduct { uuid: uuid.into(), name: uuid.into(), ..Default::default() };
        store.insert_products(vec![product("p3")]).unwrap();

        let err = load_products(&store, vec![product("p1"), product("p2"), product("p3")], 1).unwrap_err();
        assert!(err.to_string().contains("p3"));
        assert!(store.get_product("p1").unwrap().is_none());

        let err = load_products(&store, vec![product("p1"), product("p1")], 1).unwrap_err();
        assert!(err.to_string().contains("more than once"));

        assert_eq!(load_products(&store, vec![product("p1"), product("p2")], 1).unwrap(), 2);
    }
}
