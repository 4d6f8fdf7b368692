//! Catalog browsing: search, filtering and sorting over a product snapshot,
//! plus construction of new catalog entries.

use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::product::{EditRecord, EntityId, NewProduct, Product};

/// Filters for listing products. All text matching is case-insensitive.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProductFilters {
    /// Substring matched against name, type and supplier.
    pub search: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub supplier: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Price,
    Quantity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort order query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SortOption {
    #[serde(default)]
    pub sort: SortField,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Apply filters and sort order to a product snapshot.
pub fn filter_products(
    products: &[Product],
    filters: &ProductFilters,
    sort: SortOption,
) -> Result<Vec<Product>, AppError> {
    if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
        if min > max {
            return Err(AppError::Validation(format!(
                "min_price ({min}) must not exceed max_price ({max})"
            )));
        }
    }

    let search = normalized(&filters.search);
    let name = normalized(&filters.name);
    let product_type = normalized(&filters.product_type);
    let supplier = normalized(&filters.supplier);

    let mut matches: Vec<&Product> = products
        .iter()
        .filter(|p| {
            search.as_deref().map_or(true, |q| {
                contains(&p.name, q) || contains(&p.product_type, q) || contains(&p.supplier, q)
            })
        })
        .filter(|p| name.as_deref().map_or(true, |q| contains(&p.name, q)))
        .filter(|p| {
            product_type
                .as_deref()
                .map_or(true, |q| p.product_type.to_lowercase() == q)
        })
        .filter(|p| supplier.as_deref().map_or(true, |q| p.supplier.to_lowercase() == q))
        .filter(|p| filters.min_price.map_or(true, |min| p.price >= min))
        .filter(|p| filters.max_price.map_or(true, |max| p.price <= max))
        .collect();

    matches.sort_by(|a, b| {
        let ordering = compare(a, b, sort.sort);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    Ok(matches.into_iter().cloned().collect())
}

/// Build a catalog entry from a creation request, stamped with its first
/// edit record.
pub fn build_product(request: &NewProduct, now: DateTime<Utc>) -> Result<Product, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if !request.price.is_finite() || request.price < 0.0 {
        return Err(AppError::Validation(
            "price must be a non-negative amount".to_string(),
        ));
    }

    Ok(Product {
        id: EntityId::Text(now.timestamp_millis().to_string()),
        name: request.name.trim().to_string(),
        product_type: request.product_type.clone(),
        barcode: request.barcode.clone(),
        price: request.price,
        solde: None,
        supplier: request.supplier.clone(),
        image: request.image.clone(),
        stocks: Vec::new(),
        edited_by: vec![EditRecord {
            warehouseman_id: request.warehouseman_id.clone(),
            at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_stock: Some(0),
        }],
    })
}

fn compare(a: &Product, b: &Product, field: SortField) -> Ordering {
    match field {
        SortField::Name => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Quantity => a.total_quantity().cmp(&b.total_quantity()),
    }
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
