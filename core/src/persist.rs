//! sled-backed catalog store. Values are bincode-encoded, keyed by uuid.

use crate::category::CategoryLookup;
use crate::listing::{ListParams, Page};
use crate::{now_rfc3339, Brand, CatalogError, Category, NewProduct, Product, ProductPatch, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::collections::HashSet;
use std::path::Path;

const PRODUCTS: &str = "products";
const CATEGORIES: &str = "categories";
const BRANDS: &str = "brands";

pub struct CatalogStore {
    db: sled::Db,
    products: sled::Tree,
    categories: sled::Tree,
    brands: sled::Tree,
}

impl CatalogStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// In-memory store removed on drop.
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        Ok(Self {
            products: db.open_tree(PRODUCTS)?,
            categories: db.open_tree(CATEGORIES)?,
            brands: db.open_tree(BRANDS)?,
            db,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Inserts the whole batch or nothing. A uuid that repeats inside the
    /// batch or is already stored fails with [`CatalogError::Conflict`].
    pub fn insert_products(&self, batch: Vec<NewProduct>) -> Result<Vec<Product>> {
        let now = now_rfc3339();
        let mut seen = HashSet::new();
        let mut products = Vec::with_capacity(batch.len());
        let mut encoded = Vec::with_capacity(batch.len());
        for new in batch {
            if !seen.insert(new.uuid.clone()) {
                return Err(CatalogError::Conflict(new.uuid));
            }
            let product = Product::from_new(new, &now);
            encoded.push((product.uuid.clone(), bincode::serialize(&product)?));
            products.push(product);
        }

        let result: std::result::Result<(), TransactionError<String>> = self.products.transaction(|tx| {
            for (uuid, bytes) in &encoded {
                if tx.get(uuid.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(uuid.clone()));
                }
                tx.insert(uuid.as_bytes(), bytes.as_slice())?;
            }
            Ok(())
        });
        match result {
            Ok(()) => {
                tracing::info!(count = products.len(), "products stored");
                Ok(products)
            }
            Err(TransactionError::Abort(uuid)) => Err(CatalogError::Conflict(uuid)),
            Err(TransactionError::Storage(err)) => Err(CatalogError::Storage(err)),
        }
    }

    pub fn get_product(&self, uuid: &str) -> Result<Option<Product>> {
        get(&self.products, uuid)
    }

    /// Products for `uuids` in the given order; unknown ones are skipped.
    pub fn products_by_uuids<S: AsRef<str>>(&self, uuids: &[S]) -> Result<Vec<Product>> {
        let mut out = Vec::with_capacity(uuids.len());
        for uuid in uuids {
            if let Some(product) = self.get_product(uuid.as_ref())? {
                out.push(product);
            }
        }
        Ok(out)
    }

    pub fn update_product(&self, uuid: &str, patch: ProductPatch) -> Result<Product> {
        let mut product = self
            .get_product(uuid)?
            .ok_or_else(|| CatalogError::NotFound(format!("product {uuid}")))?;
        product.apply(patch, &now_rfc3339());
        put(&self.products, &product.uuid, &product)?;
        Ok(product)
    }

    /// `false` when no such product existed.
    pub fn delete_product(&self, uuid: &str) -> Result<bool> {
        Ok(self.products.remove(uuid.as_bytes())?.is_some())
    }

    pub fn all_products(&self) -> Result<Vec<Product>> {
        self.products
            .iter()
            .values()
            .map(|value| -> Result<Product> { Ok(bincode::deserialize(&value?)?) })
            .collect()
    }

    pub fn list_products(&self, params: &ListParams) -> Result<Page<Product>> {
        Ok(params.apply(self.all_products()?))
    }

    pub fn put_category(&self, category: &Category) -> Result<()> {
        put(&self.categories, &category.uuid, category)
    }

    pub fn get_category(&self, uuid: &str) -> Result<Option<Category>> {
        get(&self.categories, uuid)
    }

    pub fn put_brand(&self, brand: &Brand) -> Result<()> {
        put(&self.brands, &brand.uuid, brand)
    }

    pub fn get_brand(&self, uuid: &str) -> Result<Option<Brand>> {
        get(&self.brands, uuid)
    }
}

impl CategoryLookup for CatalogStore {
    fn parent_of(&self, category: &Category) -> Result<Option<Category>> {
        let Some(parent_uuid) = category.parent_uuid.as_deref() else {
            return Ok(None);
        };
        let parent = self.get_category(parent_uuid)?;
        if parent.is_none() {
            tracing::warn!(category = %category.uuid, parent = parent_uuid, "dangling parent reference");
        }
        Ok(parent)
    }
}

fn get<T: DeserializeOwned>(tree: &sled::Tree, key: &str) -> Result<Option<T>> {
    match tree.get(key.as_bytes())? {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}

fn put<T: Serialize>(tree: &sled::Tree, key: &str, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value)?;
    tree.insert(key.as_bytes(), bytes)?;
    Ok(())
}
