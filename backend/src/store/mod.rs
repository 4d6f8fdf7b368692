//! HTTP client for the remote product/warehouseman data store.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::product::{EntityId, Product};
use crate::models::warehouseman::Warehouseman;

/// Handle on the remote REST store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    /// Create a client for the store rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the product listing as untyped JSON, for callers that validate
    /// the payload shape themselves.
    pub async fn fetch_products_raw(&self) -> Result<Value, AppError> {
        let resp = self.client.get(self.url("products")).send().await?;
        let resp = check_status(resp, "list products")?;
        Ok(resp.json::<Value>().await?)
    }

    /// Fetch and coerce every product.
    pub async fn fetch_all_products(&self) -> Result<Vec<Product>, AppError> {
        let raw = self.fetch_products_raw().await?;
        Product::list_from_value(&raw)
    }

    /// Fetch a product by id.
    pub async fn fetch_product(&self, id: &EntityId) -> Result<Product, AppError> {
        let resp = self.client.get(self.product_url(id)?).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Product {id} not found")));
        }
        let resp = check_status(resp, "fetch product")?;
        product_from_body(resp, "fetch product").await
    }

    /// Look up the first product carrying `barcode`.
    pub async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, AppError> {
        let url = Url::parse_with_params(&self.url("products"), &[("barcode", barcode)])
            .map_err(|e| AppError::Internal(format!("invalid store URL: {e}")))?;
        let resp = self.client.get(url).send().await?;
        let resp = check_status(resp, "find product by barcode")?;
        let raw = resp.json::<Value>().await?;
        Ok(Product::list_from_value(&raw)?.into_iter().next())
    }

    /// Store a new product.
    pub async fn create_product(&self, product: &Product) -> Result<Product, AppError> {
        let resp = self
            .client
            .post(self.url("products"))
            .json(product)
            .send()
            .await?;
        let resp = check_status(resp, "create product")?;
        product_from_body(resp, "create product").await
    }

    /// Replace a stored product with `product`.
    pub async fn update_product(&self, product: &Product) -> Result<Product, AppError> {
        let id = &product.id;
        let resp = self
            .client
            .put(self.product_url(id)?)
            .json(product)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Product {id} not found")));
        }
        let resp = check_status(resp, "update product")?;
        product_from_body(resp, "update product").await
    }

    /// List warehousemen.
    pub async fn fetch_warehousemen(&self) -> Result<Vec<Warehouseman>, AppError> {
        let resp = self.client.get(self.url("warehousemans")).send().await?;
        let resp = check_status(resp, "list warehousemen")?;
        Ok(resp.json::<Vec<Warehouseman>>().await?)
    }

    /// Check that the store answers the product listing.
    pub async fn ping(&self) -> Result<(), AppError> {
        let resp = self.client.get(self.url("products")).send().await?;
        check_status(resp, "ping")?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// URL of one product. The id is pushed as a single percent-encoded
    /// path segment, so it can never address another resource.
    fn product_url(&self, id: &EntityId) -> Result<Url, AppError> {
        let segment = id.to_string();
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(AppError::NotFound(format!("Product '{segment}' not found")));
        }

        let mut url = Url::parse(&self.url("products"))
            .map_err(|e| AppError::Internal(format!("invalid store URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("store URL cannot hold a path".to_string()))?
            .push(&segment);
        Ok(url)
    }
}

/// Decode a single-product response. Anything but a JSON object means the
/// store answered for some other resource.
async fn product_from_body(resp: Response, operation: &str) -> Result<Product, AppError> {
    let raw = resp.json::<Value>().await?;
    if !raw.is_object() {
        tracing::warn!(operation, "Data store returned a non-object product body");
        return Err(AppError::Store(format!(
            "{operation} returned a non-object body"
        )));
    }
    Ok(Product::from_value(&raw))
}

fn check_status(resp: Response, operation: &str) -> Result<Response, AppError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    tracing::warn!(%status, url = %resp.url(), operation, "Data store rejected request");
    Err(AppError::Store(format!("{operation} failed with status {status}")))
}
