use serde::{Deserialize, Serialize};

pub mod boost;
pub mod category;
pub mod composer;
pub mod config;
pub mod error;
pub mod listing;
pub mod normalize;
pub mod persist;
pub mod query;
pub mod rules;
pub mod sink;

pub use error::{CatalogError, Result};

/// A stored catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub uuid: String,
    pub name: String,
    pub description: Option<String>,
    pub oem: Option<String>,
    pub article: Option<String>,
    pub category_uuid: Option<String>,
    pub brand_uuid: Option<String>,
    pub product_group_uuid: Option<String>,
    pub disabled: bool,
    pub price: Option<f64>,
    pub prop_value: Option<String>,
    pub url_slug: String,
    pub image_prefix: Option<String>,
    pub filter_value_uuids: Vec<String>,
    pub analog_uuids: Vec<String>,
    /// RFC 3339, UTC
    pub created_at: String,
    pub updated_at: String,
}

/// Product as submitted for creation. `url_slug` falls back to the uuid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub oem: Option<String>,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub category_uuid: Option<String>,
    #[serde(default)]
    pub brand_uuid: Option<String>,
    #[serde(default)]
    pub product_group_uuid: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub prop_value: Option<String>,
    #[serde(default)]
    pub url_slug: Option<String>,
    #[serde(default)]
    pub image_prefix: Option<String>,
    #[serde(default)]
    pub filter_value_uuids: Vec<String>,
    #[serde(default)]
    pub analog_uuids: Vec<String>,
}

/// Partial update. `None` leaves the stored value untouched; relation
/// lists that are present replace the stored lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub oem: Option<String>,
    pub article: Option<String>,
    pub category_uuid: Option<String>,
    pub brand_uuid: Option<String>,
    pub product_group_uuid: Option<String>,
    pub disabled: Option<bool>,
    pub price: Option<f64>,
    pub prop_value: Option<String>,
    pub url_slug: Option<String>,
    pub image_prefix: Option<String>,
    pub filter_value_uuids: Option<Vec<String>>,
    pub analog_uuids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub parent_uuid: Option<String>,
    #[serde(default)]
    pub url_slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub uuid: String,
    pub name: String,
}

impl Product {
    pub fn from_new(new: NewProduct, now: &str) -> Self {
        let url_slug = match new.url_slug {
            Some(slug) if !slug.is_empty() => slug,
            _ => new.uuid.clone(),
        };
        Self {
            uuid: new.uuid,
            name: new.name,
            description: new.description,
            oem: new.oem,
            article: new.article,
            category_uuid: new.category_uuid,
            brand_uuid: new.brand_uuid,
            product_group_uuid: new.product_group_uuid,
            disabled: new.disabled,
            price: new.price,
            prop_value: new.prop_value,
            url_slug,
            image_prefix: new.image_prefix,
            filter_value_uuids: new.filter_value_uuids,
            analog_uuids: new.analog_uuids,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn apply(&mut self, patch: ProductPatch, now: &str) {
        if let Some(v) = patch.name { self.name = v; }
        if let Some(v) = patch.description { self.description = Some(v); }
        if let Some(v) = patch.oem { self.oem = Some(v); }
        if let Some(v) = patch.article { self.article = Some(v); }
        if let Some(v) = patch.category_uuid { self.category_uuid = Some(v); }
        if let Some(v) = patch.brand_uuid { self.brand_uuid = Some(v); }
        if let Some(v) = patch.product_group_uuid { self.product_group_uuid = Some(v); }
        if let Some(v) = patch.disabled { self.disabled = v; }
        if let Some(v) = patch.price { self.price = Some(v); }
        if let Some(v) = patch.prop_value { self.prop_value = Some(v); }
        if let Some(v) = patch.url_slug { self.url_slug = v; }
        if let Some(v) = patch.image_prefix { self.image_prefix = Some(v); }
        if let Some(v) = patch.filter_value_uuids { self.filter_value_uuids = v; }
        if let Some(v) = patch.analog_uuids { self.analog_uuids = v; }
        self.updated_at = now.to_string();
    }

    /// String view of a filterable/sortable column, `None` when unset.
    pub fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "uuid" => Some(self.uuid.clone()),
            "name" => Some(self.name.clone()),
            "description" => self.description.clone(),
            "oem" => self.oem.clone(),
            "article" => self.article.clone(),
            "category_uuid" => self.category_uuid.clone(),
            "brand_uuid" => self.brand_uuid.clone(),
            "product_group_uuid" => self.product_group_uuid.clone(),
            "disabled" => Some(if self.disabled { "1".into() } else { "0".into() }),
            "price" => self.price.map(|p| p.to_string()),
            "prop_value" => self.prop_value.clone(),
            "url_slug" => Some(self.url_slug.clone()),
            "image_prefix" => self.image_prefix.clone(),
            "created_at" => Some(self.created_at.clone()),
            "updated_at" => Some(self.updated_at.clone()),
            _ => None,
        }
    }
}

/// Current UTC time as RFC 3339.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into())
}
