//! Root-to-leaf category chains (breadcrumbs).

use crate::{Category, CatalogError, Result};
use std::collections::{HashMap, HashSet};

/// Deepest hierarchy accepted before the walk is treated as broken.
pub const MAX_CATEGORY_DEPTH: usize = 64;

/// Parent lookup over whatever holds the categories.
pub trait CategoryLookup {
    /// `Ok(None)` for a root, or when the parent reference dangles.
    fn parent_of(&self, category: &Category) -> Result<Option<Category>>;
}

impl CategoryLookup for HashMap<String, Category> {
    fn parent_of(&self, category: &Category) -> Result<Option<Category>> {
        Ok(category.parent_uuid.as_ref().and_then(|uuid| self.get(uuid).cloned()))
    }
}

/// Walks from `category` up through its parents, appending each visited
/// node to `acc`, then reverses `acc` so the root comes first.
///
/// A parent reference that revisits a category fails with
/// [`CatalogError::CategoryCycle`]; more than [`MAX_CATEGORY_DEPTH`]
/// levels fails with [`CatalogError::CategoryTooDeep`].
pub fn build_chain<L>(lookup: &L, category: Category, mut acc: Vec<Category>) -> Result<Vec<Category>>
where
    L: CategoryLookup + ?Sized,
{
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = Some(category);
    while let Some(node) = current {
        if !visited.insert(node.uuid.clone()) {
            tracing::error!(category = %node.uuid, "category parent chain is cyclic");
            return Err(CatalogError::CategoryCycle(node.uuid));
        }
        if visited.len() > MAX_CATEGORY_DEPTH {
            return Err(CatalogError::CategoryTooDeep(MAX_CATEGORY_DEPTH));
        }
        current = lookup.parent_of(&node)?;
        acc.push(node);
    }
    acc.reverse();
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(uuid: &str, parent: Option<&str>) -> Category {
        Category { uuid: uuid.into(), name: uuid.to_uppercase(), parent_uuid: parent.map(Into::into), url_slug: None }
    }

    #[test]
    fn dangling_parent_ends_chain() {
        let lookup: HashMap<String, Category> = HashMap::new();
        let chain = build_chain(&lookup, cat("c", Some("gone")), Vec::new()).unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let mut lookup = HashMap::new();
        lookup.insert("c".to_string(), cat("c", Some("c")));
        let err = build_chain(&lookup, cat("c", Some("c")), Vec::new()).unwrap_err();
        assert!(matches!(err, CatalogError::CategoryCycle(uuid) if uuid == "c"));
    }

    #[test]
    fn depth_is_bounded() {
        let mut lookup = HashMap::new();
        for i in 0..=MAX_CATEGORY_DEPTH + 1 {
            let parent = format!("n{}", i + 1);
            lookup.insert(format!("n{i}"), cat(&format!("n{i}"), Some(&parent)));
        }
        let start = lookup["n0"].clone();
        let err = build_chain(&lookup, start, Vec::new()).unwrap_err();
        assert!(matches!(err, CatalogError::CategoryTooDeep(_)));
    }
}
