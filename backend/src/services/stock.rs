//! Stock location edits.
//!
//! Every edit returns an updated copy of the product with a fresh entry at
//! the head of `editedBy`. That entry carries the post-edit `totalStock`,
//! which is what the dashboard compares to detect movements.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::AppError;
use crate::models::product::{
    EditRecord, EntityId, Localisation, NewStockLocation, Product, StockEntry,
    StockLocationPatch,
};

/// Set the quantity held at `stock_id`, creating the entry if the product
/// has none with that id. Negative quantities are clamped to zero.
pub fn set_quantity(
    product: &Product,
    stock_id: &EntityId,
    quantity: i64,
    editor: &EntityId,
    now: DateTime<Utc>,
) -> Product {
    let quantity = quantity.max(0);
    let mut updated = product.clone();

    match updated.stocks.iter_mut().find(|s| &s.id == stock_id) {
        Some(entry) => entry.quantity = quantity,
        None => updated.stocks.push(StockEntry {
            id: stock_id.clone(),
            name: None,
            quantity,
            localisation: None,
        }),
    }

    record_edit(&mut updated, editor, now);
    updated
}

/// Append a new stock location. Its id is one past the highest numeric id
/// already in use.
pub fn add_location(
    product: &Product,
    location: &NewStockLocation,
    now: DateTime<Utc>,
) -> Result<Product, AppError> {
    let city = location.city.trim();
    if city.is_empty() {
        return Err(AppError::Validation("city is required".to_string()));
    }

    let mut updated = product.clone();
    let next_id = updated
        .stocks
        .iter()
        .filter_map(|s| s.id.as_number())
        .max()
        .unwrap_or(0)
        .saturating_add(1);

    updated.stocks.push(StockEntry {
        id: EntityId::Number(next_id),
        name: Some(location.name.clone()),
        quantity: location.quantity.max(0),
        localisation: Some(Localisation {
            city: Some(city.to_string()),
            latitude: Some(location.latitude),
            longitude: Some(location.longitude),
        }),
    });

    record_edit(&mut updated, &location.warehouseman_id, now);
    Ok(updated)
}

/// Apply a partial update to an existing stock location.
pub fn modify_location(
    product: &Product,
    stock_id: &EntityId,
    patch: &StockLocationPatch,
    now: DateTime<Utc>,
) -> Result<Product, AppError> {
    if patch.city.as_deref().is_some_and(|c| c.trim().is_empty()) {
        return Err(AppError::Validation("city must not be empty".to_string()));
    }

    let mut updated = product.clone();
    let entry = updated
        .stocks
        .iter_mut()
        .find(|s| &s.id == stock_id)
        .ok_or_else(|| stock_not_found(product, stock_id))?;

    if let Some(name) = &patch.name {
        entry.name = Some(name.clone());
    }
    if let Some(quantity) = patch.quantity {
        entry.quantity = quantity.max(0);
    }
    if patch.city.is_some() || patch.latitude.is_some() || patch.longitude.is_some() {
        let localisation = entry.localisation.get_or_insert_with(Localisation::default);
        if let Some(city) = &patch.city {
            localisation.city = Some(city.trim().to_string());
        }
        if patch.latitude.is_some() {
            localisation.latitude = patch.latitude;
        }
        if patch.longitude.is_some() {
            localisation.longitude = patch.longitude;
        }
    }

    record_edit(&mut updated, &patch.warehouseman_id, now);
    Ok(updated)
}

/// Remove a stock location.
pub fn remove_location(
    product: &Product,
    stock_id: &EntityId,
    editor: &EntityId,
    now: DateTime<Utc>,
) -> Result<Product, AppError> {
    if !product.stocks.iter().any(|s| &s.id == stock_id) {
        return Err(stock_not_found(product, stock_id));
    }

    let mut updated = product.clone();
    updated.stocks.retain(|s| &s.id != stock_id);
    record_edit(&mut updated, editor, now);
    Ok(updated)
}

/// Prepend an edit record holding the product's current stock total.
fn record_edit(product: &mut Product, editor: &EntityId, now: DateTime<Utc>) {
    let record = EditRecord {
        warehouseman_id: editor.clone(),
        at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        total_stock: Some(product.total_quantity()),
    };
    product.edited_by.insert(0, record);
}

fn stock_not_found(product: &Product, stock_id: &EntityId) -> AppError {
    AppError::NotFound(format!(
        "Stock location {stock_id} not found on product {}",
        product.id
    ))
}
