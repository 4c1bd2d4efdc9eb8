//! Filter, sort, include and pagination parameters of the product list,
//! restricted to allow-lists.
//!
//! Parameters use the bracket syntax of JSON:API style endpoints:
//! `filter[name]=pad,disc&sort=-created_at,name&include=brand&page[number]=2&page[size]=10`.

use crate::{CatalogError, Product, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Case-insensitive substring filters.
pub const PARTIAL_FILTERS: &[&str] = &["name", "description", "oem"];
pub const EXACT_FILTERS: &[&str] = &[
    "uuid",
    "category_uuid",
    "brand_uuid",
    "product_group_uuid",
    "article",
    "disabled",
    "price",
    "prop_value",
    "url_slug",
];
pub const SORTS: &[&str] = &["uuid", "name", "image_prefix", "created_at", "updated_at"];
pub const INCLUDES: &[&str] = &["brand", "filterValues", "productGroup", "category", "analogs"];

pub const DEFAULT_PAGE_SIZE: usize = 30;
pub const MAX_PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Partial,
    Exact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub kind: FilterKind,
    /// Any of these values matches.
    pub values: Vec<String>,
}

impl Filter {
    pub fn matches(&self, product: &Product) -> bool {
        let Some(actual) = product.field_value(&self.field) else {
            return false;
        };
        match self.kind {
            FilterKind::Partial => {
                let actual = actual.to_lowercase();
                self.values.iter().any(|v| actual.contains(&v.to_lowercase()))
            }
            FilterKind::Exact if self.field == "price" => {
                let Ok(actual) = actual.parse::<f64>() else { return false };
                self.values.iter().any(|v| v.parse::<f64>().map(|v| v == actual).unwrap_or(false))
            }
            FilterKind::Exact if self.field == "disabled" => {
                self.values.iter().any(|v| normalize_flag(v) == Some(actual.as_str()))
            }
            FilterKind::Exact => self.values.iter().any(|v| *v == actual),
        }
    }
}

fn normalize_flag(value: &str) -> Option<&'static str> {
    match value {
        "1" | "true" => Some("1"),
        "0" | "false" => Some("0"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub filters: Vec<Filter>,
    pub sorts: Vec<Sort>,
    pub includes: Vec<String>,
    pub page: usize,
    pub per_page: usize,
}

impl Default for ListParams {
    fn default() -> Self {
        Self { filters: Vec::new(), sorts: Vec::new(), includes: Vec::new(), page: 1, per_page: DEFAULT_PAGE_SIZE }
    }
}

impl ListParams {
    /// Parses raw query-string pairs; parameters outside the allow-lists
    /// are rejected with [`CatalogError::InvalidQuery`]. Unrelated keys are ignored.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self> {
        let mut list = ListParams::default();
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();
        for key in keys {
            let value = &params[key];
            if let Some(field) = bracketed(key, "filter") {
                list.filters.push(parse_filter(field, value)?);
            } else if key == "sort" {
                list.sorts = parse_sorts(value)?;
            } else if key == "include" {
                list.includes = parse_includes(value)?;
            } else if key == "page[number]" {
                list.page = parse_positive(key, value)?;
            } else if key == "page[size]" {
                list.per_page = parse_positive(key, value)?.min(MAX_PAGE_SIZE);
            }
        }
        Ok(list)
    }

    pub fn includes(&self, name: &str) -> bool {
        self.includes.iter().any(|i| i == name)
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.filters.iter().all(|f| f.matches(product))
    }

    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        for sort in &self.sorts {
            let ord = a.field_value(&sort.field).cmp(&b.field_value(&sort.field));
            let ord = if sort.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Filters, sorts (stable) and cuts the requested page.
    pub fn apply(&self, products: Vec<Product>) -> Page<Product> {
        let mut matched: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        let total = matched.len();
        let data = matched
            .into_iter()
            .skip((self.page - 1).saturating_mul(self.per_page))
            .take(self.per_page)
            .collect();
        Page {
            data,
            meta: PageMeta {
                current_page: self.page,
                per_page: self.per_page,
                total,
                last_page: total.div_ceil(self.per_page).max(1),
            },
        }
    }
}

fn bracketed<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)?.strip_prefix('[')?.strip_suffix(']')
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_filter(field: &str, value: &str) -> Result<Filter> {
    let kind = if PARTIAL_FILTERS.contains(&field) {
        FilterKind::Partial
    } else if EXACT_FILTERS.contains(&field) {
        FilterKind::Exact
    } else {
        return Err(CatalogError::InvalidQuery(format!(
            "requested filter `{field}` is not allowed, allowed filters are {}",
            PARTIAL_FILTERS.iter().chain(EXACT_FILTERS).copied().collect::<Vec<_>>().join(", ")
        )));
    };
    Ok(Filter { field: field.to_string(), kind, values: split_list(value).map(str::to_string).collect() })
}

fn parse_sorts(value: &str) -> Result<Vec<Sort>> {
    split_list(value)
        .map(|item| {
            let (field, descending) = match item.strip_prefix('-') {
                Some(field) => (field, true),
                None => (item, false),
            };
            if !SORTS.contains(&field) {
                return Err(CatalogError::InvalidQuery(format!(
                    "requested sort `{field}` is not allowed, allowed sorts are {}",
                    SORTS.join(", ")
                )));
            }
            Ok(Sort { field: field.to_string(), descending })
        })
        .collect()
}

fn parse_includes(value: &str) -> Result<Vec<String>> {
    split_list(value)
        .map(|item| {
            if INCLUDES.contains(&item) {
                Ok(item.to_string())
            } else {
                Err(CatalogError::InvalidQuery(format!(
                    "requested include `{item}` is not allowed, allowed includes are {}",
                    INCLUDES.join(", ")
                )))
            }
        })
        .collect()
}

fn parse_positive(key: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CatalogError::InvalidQuery(format!("`{key}` must be a positive integer"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub current_page: usize,
    pub per_page: usize,
    pub total: usize,
    pub last_page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page { data: self.data.into_iter().map(f).collect(), meta: self.meta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn product(uuid: &str, name: &str) -> Product {
        Product::from_new(
            crate::NewProduct { uuid: uuid.into(), name: name.into(), ..Default::default() },
            "2024-01-01T00:00:00Z",
        )
    }

    #[test]
    fn rejects_unknown_filter_and_sort() {
        assert!(ListParams::from_query(&params(&[("filter[secret]", "x")])).is_err());
        assert!(ListParams::from_query(&params(&[("sort", "-price")])).is_err());
        assert!(ListParams::from_query(&params(&[("include", "owner")])).is_err());
        assert!(ListParams::from_query(&params(&[("page[size]", "0")])).is_err());
    }

    #[test]
    fn page_size_is_capped() {
        let list = ListParams::from_query(&params(&[("page[size]", "500")])).unwrap();
        assert_eq!(list.per_page, MAX_PAGE_SIZE);
    }

    #[test]
    fn partial_filter_is_case_insensitive_any_of() {
        let list = ListParams::from_query(&params(&[("filter[name]", "PAD,disc")])).unwrap();
        assert!(list.matches(&product("1", "Brake pads")));
        assert!(list.matches(&product("2", "Brake Disc")));
        assert!(!list.matches(&product("3", "Oil filter")));
    }

    #[test]
    fn sorts_and_paginates() {
        let list = ListParams::from_query(&params(&[("sort", "-name"), ("page[size]", "2"), ("page[number]", "2")]))
            .unwrap();
        let page = list.apply(vec![product("1", "a"), product("2", "c"), product("3", "b")]);
        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.last_page, 2);
        assert_eq!(page.data.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["a"]);
    }
}
