//! Dashboard statistics aggregation over a product catalog snapshot.
//!
//! Aggregation is a pure function of the product list and a reference
//! instant; callers fetch the snapshot and pick `now`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::product::{EditRecord, EntityId, Product};
use crate::store::RestStore;

/// Default trailing window for stock movements, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Default length of each movement ranking.
pub const DEFAULT_TOP_N: usize = 5;

/// Tuning knobs for a dashboard computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    pub window_days: u32,
    pub top_n: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Aggregated dashboard statistics for the overview screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_products: usize,
    pub total_cities: usize,
    pub out_of_stock_products: usize,
    pub total_stock_value: f64,
    pub most_added_products: Vec<RankedProduct>,
    pub most_removed_products: Vec<RankedProduct>,
}

/// A product in one of the movement rankings. `quantity` is always a magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedProduct {
    pub product_id: EntityId,
    pub name: String,
    pub quantity: u64,
}

/// Direction of a product's net stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Added,
    Removed,
}

/// Most recent non-zero stock change of a product inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub kind: MovementKind,
    pub quantity: u64,
}

/// Fetch a fresh product snapshot and aggregate it.
pub async fn get_stats(
    store: &RestStore,
    now: DateTime<Utc>,
    options: DashboardOptions,
) -> Result<DashboardSummary, AppError> {
    let raw = store.fetch_products_raw().await?;
    // A malformed listing is the store's fault, not the caller's.
    let summary = compute_dashboard_from_json(&raw, now, options)
        .map_err(|e| AppError::Store(e.to_string()))?;

    tracing::debug!(
        products = summary.total_products,
        cities = summary.total_cities,
        out_of_stock = summary.out_of_stock_products,
        window_days = options.window_days,
        "Computed dashboard summary"
    );

    Ok(summary)
}

/// Aggregate an untyped product listing.
///
/// Fails only when the listing itself is not an array; malformed products
/// inside it are coerced with defaults.
pub fn compute_dashboard_from_json(
    products: &Value,
    now: DateTime<Utc>,
    options: DashboardOptions,
) -> Result<DashboardSummary, AppError> {
    let products = Product::list_from_value(products)?;
    Ok(compute_dashboard(&products, now, options))
}

/// Aggregate a product snapshot into dashboard statistics.
pub fn compute_dashboard(
    products: &[Product],
    now: DateTime<Utc>,
    options: DashboardOptions,
) -> DashboardSummary {
    let mut cities: HashSet<&str> = HashSet::new();
    let mut total_stock_value = 0.0;
    let mut out_of_stock_products = 0;

    for product in products {
        for stock in &product.stocks {
            if let Some(city) = stock.city() {
                cities.insert(city);
            }
            total_stock_value += stock.quantity as f64 * product.price;
        }

        if product.total_quantity() == 0 {
            out_of_stock_products += 1;
        }
    }

    let window_start = window_start(now, options.window_days);

    // One entry per product. A real id seen twice keeps the later product's
    // movement; products without an id are never merged.
    let mut movements: Vec<(&Product, Movement)> = Vec::new();
    let mut slot_by_id: HashMap<&EntityId, usize> = HashMap::new();
    for product in products {
        let Some(movement) = detect_movement(&product.edited_by, window_start, now) else {
            continue;
        };
        if product.id.is_missing() {
            movements.push((product, movement));
            continue;
        }
        match slot_by_id.get(&product.id) {
            Some(&slot) => movements[slot] = (product, movement),
            None => {
                slot_by_id.insert(&product.id, movements.len());
                movements.push((product, movement));
            }
        }
    }

    let mut most_added_products = Vec::new();
    let mut most_removed_products = Vec::new();
    for (product, movement) in movements {
        let ranked = RankedProduct {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity: movement.quantity,
        };
        match movement.kind {
            MovementKind::Added => most_added_products.push(ranked),
            MovementKind::Removed => most_removed_products.push(ranked),
        }
    }
    rank(&mut most_added_products, options.top_n);
    rank(&mut most_removed_products, options.top_n);

    DashboardSummary {
        total_products: products.len(),
        total_cities: cities.len(),
        out_of_stock_products,
        total_stock_value,
        most_added_products,
        most_removed_products,
    }
}

/// Find the most recent non-zero stock change among edits inside
/// `[window_start, now]`.
///
/// Edits are ordered newest first (stable on equal instants) and compared
/// pairwise. Records with an unparseable `at` are skipped, as are pairs where
/// either side lacks a `totalStock` snapshot.
pub fn detect_movement(
    edits: &[EditRecord],
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<Movement> {
    let mut recent: Vec<(DateTime<Utc>, &EditRecord)> = edits
        .iter()
        .filter_map(|edit| match edit.timestamp() {
            Some(at) => Some((at, edit)),
            None => {
                tracing::debug!(at = %edit.at, "Skipping edit record with unparseable timestamp");
                None
            }
        })
        .filter(|(at, _)| *at >= window_start && *at <= now)
        .collect();

    if recent.len() < 2 {
        return None;
    }

    recent.sort_by(|a, b| b.0.cmp(&a.0));

    recent.windows(2).find_map(|pair| {
        let newer = pair[0].1.total_stock?;
        let older = pair[1].1.total_stock?;
        let delta = newer.saturating_sub(older);
        match delta.cmp(&0) {
            Ordering::Greater => Some(Movement {
                kind: MovementKind::Added,
                quantity: delta.unsigned_abs(),
            }),
            Ordering::Less => Some(Movement {
                kind: MovementKind::Removed,
                quantity: delta.unsigned_abs(),
            }),
            Ordering::Equal => None,
        }
    })
}

fn window_start(now: DateTime<Utc>, window_days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(window_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Largest magnitude first, ties by product id ascending, then input order.
fn rank(entries: &mut Vec<RankedProduct>, top_n: usize) {
    entries.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    entries.truncate(top_n);
}
