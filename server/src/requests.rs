//! Validation of product create/update bodies.

use crate::error::FieldErrors;
use catalog_core::{NewProduct, ProductPatch};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

lazy_static! {
    static ref UUID_RE: Regex =
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").expect("valid regex");
    static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex");
}

/// Body of one product; every field optional so missing ones can be reported.
#[derive(Debug, Default, Deserialize)]
pub struct ProductInput {
    pub uuid: Option<String>,
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

struct Checker<'a> {
    prefix: String,
    errors: &'a mut FieldErrors,
}

impl Checker<'_> {
    fn fail(&mut self, field: &str, message: String) {
        let key = format!("{}{}", self.prefix, field);
        self.errors.entry(key).or_default().push(message);
    }

    fn required(&mut self, field: &str, value: Option<&str>) {
        if value.map(str::trim).map_or(true, str::is_empty) {
            self.fail(field, format!("The {} field is required.", label(field)));
        }
    }

    fn not_blank(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if v.trim().is_empty() {
                self.fail(field, format!("The {} field must not be empty.", label(field)));
            }
        }
    }

    fn uuid(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !UUID_RE.is_match(v) {
                self.fail(field, format!("The {} must be a valid UUID.", label(field)));
            }
        }
    }

    fn uuids(&mut self, field: &str, values: Option<&[String]>) {
        for (i, v) in values.unwrap_or(&[]).iter().enumerate() {
            self.uuid(&format!("{field}.{i}"), Some(v));
        }
    }

    fn slug(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !v.is_empty() && !SLUG_RE.is_match(v) {
                self.fail(field, format!("The {} format is invalid.", label(field)));
            }
        }
    }

    fn price(&mut self, value: Option<f64>) {
        if let Some(p) = value {
            if !p.is_finite() || p < 0.0 {
                self.fail("price", "The price must be at least 0.".to_string());
            }
        }
    }

    fn common(&mut self, input: &ProductInput) {
        self.uuid("category_uuid", input.category_uuid.as_deref());
        self.uuid("brand_uuid", input.brand_uuid.as_deref());
        self.uuid("product_group_uuid", input.product_group_uuid.as_deref());
        self.uuids("filter_value_uuids", input.filter_value_uuids.as_deref());
        self.uuids("analog_uuids", input.analog_uuids.as_deref());
        self.slug("url_slug", input.url_slug.as_deref());
        self.price(input.price);
    }
}

fn label(field: &str) -> String {
    field.split('.').next().unwrap_or(field).replace('_', " ")
}

/// Validates a create batch; keys are prefixed with the item index.
pub fn validate_store(inputs: Vec<ProductInput>) -> Result<Vec<NewProduct>, FieldErrors> {
    let mut errors = FieldErrors::new();
    if inputs.is_empty() {
        errors.insert("products".into(), vec!["At least one product is required.".into()]);
        return Err(errors);
    }
    for (idx, input) in inputs.iter().enumerate() {
        let mut check = Checker { prefix: format!("{idx}."), errors: &mut errors };
        check.required("uuid", input.uuid.as_deref());
        check.uuid("uuid", input.uuid.as_deref().filter(|u| !u.is_empty()));
        check.required("name", input.name.as_deref());
        check.common(input);
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(inputs
        .into_iter()
        .map(|input| NewProduct {
            uuid: input.uuid.unwrap_or_default(),
            name: input.name.unwrap_or_default(),
            description: input.description,
            oem: input.oem,
            article: input.article,
            category_uuid: input.category_uuid,
            brand_uuid: input.brand_uuid,
            product_group_uuid: input.product_group_uuid,
            disabled: input.disabled.unwrap_or(false),
            price: input.price,
            prop_value: input.prop_value,
            url_slug: input.url_slug,
            image_prefix: input.image_prefix,
            filter_value_uuids: input.filter_value_uuids.unwrap_or_default(),
            analog_uuids: input.analog_uuids.unwrap_or_default(),
        })
        .collect())
}

/// Validates an update body. A `uuid` in the body is ignored.
pub fn validate_update(input: ProductInput) -> Result<ProductPatch, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut check = Checker { prefix: String::new(), errors: &mut errors };
    check.not_blank("name", input.name.as_deref());
    check.not_blank("url_slug", input.url_slug.as_deref());
    check.common(&input);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(ProductPatch {
        name: input.name,
        description: input.description,
        oem: input.oem,
        article: input.article,
        category_uuid: input.category_uuid,
        brand_uuid: input.brand_uuid,
        product_group_uuid: input.product_group_uuid,
        disabled: input.disabled,
        price: input.price,
        prop_value: input.prop_value,
        url_slug: input.url_slug,
        image_prefix: input.image_prefix,
        filter_value_uuids: input.filter_value_uuids,
        analog_uuids: input.analog_uuids,
    })
}
