//! End-to-end tests for the HTTP API against an in-process fake data store.
//!
//! The fake store mimics the json-server endpoints the real store exposes
//! (`/products`, `/products/{id}`, `/warehousemans`) and keeps its data in
//! memory so tests can inspect what the API wrote back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode as AxumStatus;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use stockpulse::config::AppConfig;
use stockpulse::store::RestStore;
use stockpulse::AppState;

type Db = Arc<Mutex<Vec<Value>>>;

fn days_ago(days: i64) -> String {
    (Utc::now() - chrono::Duration::days(days)).to_rfc3339()
}

/// Three products: one restocked, one drained, one empty.
fn fixture() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "name": "Cement",
            "type": "Building",
            "barcode": "111",
            "price": 8,
            "supplier": "Lafarge",
            "image": "",
            "stocks": [
                {"id": 1, "name": "North", "quantity": 5, "localisation": {"city": "Casablanca"}},
                {"id": 2, "name": "South", "quantity": 0, "localisation": {"city": "Rabat"}}
            ],
            "editedBy": [
                {"warehousemanId": 1, "at": days_ago(2), "totalStock": 5},
                {"warehousemanId": 1, "at": days_ago(10), "totalStock": 2}
            ]
        }),
        json!({
            "id": 2,
            "name": "Bricks",
            "type": "Building",
            "barcode": "222",
            "price": 0.5,
            "supplier": "Terra",
            "image": "",
            "stocks": [
                {"id": 1, "name": "Yard", "quantity": 100, "localisation": {"city": "Casablanca"}}
            ],
            "editedBy": [
                {"warehousemanId": 2, "at": days_ago(1), "totalStock": 100},
                {"warehousemanId": 2, "at": days_ago(5), "totalStock": 140}
            ]
        }),
        json!({
            "id": 3,
            "name": "Sand",
            "type": "Aggregate",
            "barcode": "777",
            "price": 3,
            "supplier": "Terra",
            "image": "",
            "stocks": [],
            "editedBy": []
        }),
    ]
}

fn id_of(product: &Value) -> String {
    match &product["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn list_products(
    State(db): State<Db>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let products = db.lock().unwrap().clone();
    let products = match query.get("barcode") {
        Some(code) => products
            .into_iter()
            .filter(|p| p["barcode"] == *code)
            .collect(),
        None => products,
    };
    Json(Value::Array(products))
}

async fn create_product(State(db): State<Db>, Json(body): Json<Value>) -> Json<Value> {
    db.lock().unwrap().push(body.clone());
    Json(body)
}

async fn get_product(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AxumStatus> {
    let found = db.lock().unwrap().iter().find(|p| id_of(p) == id).cloned();
    found.map(Json).ok_or(AxumStatus::NOT_FOUND)
}

async fn put_product(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AxumStatus> {
    let mut products = db.lock().unwrap();
    let slot = products
        .iter_mut()
        .find(|p| id_of(p) == id)
        .ok_or(AxumStatus::NOT_FOUND)?;
    *slot = body.clone();
    Ok(Json(body))
}

async fn list_warehousemen() -> Json<Value> {
    Json(json!([
        {"id": 1, "name": "Yassine", "dob": "1991-02-11", "city": "Casablanca", "secretKey": "K-1", "warehouseId": 1},
        {"id": 2, "name": "Salma", "dob": "1988-09-30", "city": "Rabat", "secretKey": "K-2", "warehouseId": 2}
    ]))
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

/// Start the fake store, returning its base URL and a handle on its data.
async fn start_store(products: Vec<Value>) -> (String, Db) {
    let db: Db = Arc::new(Mutex::new(products));
    let app = Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product).put(put_product))
        .route("/warehousemans", get(list_warehousemen))
        .with_state(db.clone());
    (serve(app).await, db)
}

/// Start the API pointed at `store_url`.
async fn start_api(store_url: &str) -> String {
    let config = AppConfig {
        store_url: store_url.to_string(),
        store_timeout_secs: 2,
        host: "127.0.0.1".to_string(),
        port: 0,
        dashboard_window_days: 30,
        dashboard_top_n: 5,
    };
    let store = RestStore::new(&config.store_url, config.store_timeout()).unwrap();
    serve(stockpulse::routes::router(AppState { store, config })).await
}

async fn setup() -> (String, Db) {
    let (store_url, db) = start_store(fixture()).await;
    (start_api(&store_url).await, db)
}

async fn get_json(client: &Client, url: &str) -> (StatusCode, Value) {
    let resp = tokio_test::assert_ok!(client.get(url).send().await);
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn liveness_is_always_ok() {
    let (base, _db) = setup().await;
    let resp = Client::new()
        .get(format!("{base}/health/live"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn readiness_reports_store() {
    let (base, _db) = setup().await;
    let (status, body) = get_json(&Client::new(), &format!("{base}/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["store"], "connected");
}

#[tokio::test]
async fn dashboard_summarizes_store_snapshot() {
    let (base, _db) = setup().await;
    let (status, body) = get_json(&Client::new(), &format!("{base}/api/v1/dashboard/stats")).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["totalProducts"], 3);
    assert_eq!(data["totalCities"], 2);
    assert_eq!(data["outOfStockProducts"], 1);
    assert_eq!(data["totalStockValue"], 90.0);
    assert_eq!(
        data["mostAddedProducts"],
        json!([{"productId": 1, "name": "Cement", "quantity": 3}])
    );
    assert_eq!(
        data["mostRemovedProducts"],
        json!([{"productId": 2, "name": "Bricks", "quantity": 40}])
    );
}

#[tokio::test]
async fn dashboard_query_overrides_window_and_ranking_size() {
    let (base, _db) = setup().await;
    let client = Client::new();

    let (_, body) = get_json(&client, &format!("{base}/api/v1/dashboard/stats?top_n=0")).await;
    assert_eq!(body["data"]["mostAddedProducts"], json!([]));
    assert_eq!(body["data"]["mostRemovedProducts"], json!([]));

    // A 7-day window drops Cement's older snapshot but keeps both of Bricks'.
    let (_, body) =
        get_json(&client, &format!("{base}/api/v1/dashboard/stats?window_days=7")).await;
    assert_eq!(body["data"]["mostAddedProducts"], json!([]));
    assert_eq!(body["data"]["mostRemovedProducts"][0]["productId"], 2);
}

#[tokio::test]
async fn malformed_store_listing_is_a_gateway_error() {
    let app = Router::new().route(
        "/products",
        get(|| async { Json(json!({"error": "maintenance"})) }),
    );
    let store_url = serve(app).await;
    let base = start_api(&store_url).await;

    let (status, body) = get_json(&Client::new(), &format!("{base}/api/v1/dashboard/stats")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["data"].is_null());
    assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn unreachable_store_is_a_gateway_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let base = start_api(&dead).await;

    let (status, _) = get_json(&Client::new(), &format!("{base}/api/v1/dashboard/stats")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn product_listing_filters_and_sorts() {
    let (base, _db) = setup().await;
    let client = Client::new();

    let (_, body) = get_json(&client, &format!("{base}/api/v1/products?search=terra")).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Bricks", "Sand"]);

    let (_, body) = get_json(
        &client,
        &format!("{base}/api/v1/products?sort=price&direction=desc"),
    )
    .await;
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3, 2]);

    let (status, body) = get_json(
        &client,
        &format!("{base}/api/v1/products?min_price=10&max_price=1"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn barcode_lookup() {
    let (base, _db) = setup().await;
    let client = Client::new();

    let (status, body) = get_json(&client, &format!("{base}/api/v1/products/barcode/777")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Sand");

    let (status, body) = get_json(&client, &format!("{base}/api/v1/products/barcode/000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let (base, _db) = setup().await;
    let (status, _) = get_json(&Client::new(), &format!("{base}/api/v1/products/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn encoded_slash_in_product_id_stays_inside_products() {
    let (base, db) = setup().await;
    let client = Client::new();
    let before = db.lock().unwrap().clone();

    let (status, body) =
        get_json(&client, &format!("{base}/api/v1/products/..%2Fwarehousemans")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["data"].is_null());

    let resp = client
        .put(format!("{base}/api/v1/products/..%2Fwarehousemans/stocks/1"))
        .json(&json!({"warehouseman_id": 1, "quantity": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(*db.lock().unwrap(), before);
}

#[tokio::test]
async fn non_object_product_body_is_a_gateway_error() {
    let app = Router::new().route(
        "/products/{id}",
        get(|| async { Json(json!([{"id": 1, "name": "Cement"}])) }),
    );
    let store_url = serve(app).await;
    let base = start_api(&store_url).await;

    let (status, body) = get_json(&Client::new(), &format!("{base}/api/v1/products/1")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn stock_edits_are_written_back_and_ranked() {
    let (base, db) = setup().await;
    let client = Client::new();
    let url = format!("{base}/api/v1/products/3/stocks/1");

    let resp = client
        .put(&url)
        .json(&json!({"warehouseman_id": 2, "quantity": 12}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["stocks"][0]["quantity"], 12);

    // Give the second edit a strictly later timestamp.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let resp = client
        .put(&url)
        .json(&json!({"warehouseman_id": 2, "quantity": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    {
        let products = db.lock().unwrap();
        let sand = products.iter().find(|p| p["id"] == 3).unwrap();
        assert_eq!(sand["editedBy"][0]["totalStock"], 4);
        assert_eq!(sand["editedBy"][0]["warehousemanId"], 2);
        assert_eq!(sand["editedBy"][1]["totalStock"], 12);
    }

    let (_, body) = get_json(&client, &format!("{base}/api/v1/dashboard/stats")).await;
    assert_eq!(body["data"]["outOfStockProducts"], 0);
    assert_eq!(
        body["data"]["mostRemovedProducts"],
        json!([
            {"productId": 2, "name": "Bricks", "quantity": 40},
            {"productId": 3, "name": "Sand", "quantity": 8}
        ])
    );
}

#[tokio::test]
async fn stock_location_lifecycle() {
    let (base, db) = setup().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/api/v1/products/1/stocks"))
        .json(&json!({
            "warehouseman_id": 1,
            "name": "East",
            "city": "Tangier",
            "quantity": 7,
            "latitude": 35.76,
            "longitude": -5.83
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["stocks"][2]["id"], 3);

    let resp = client
        .patch(format!("{base}/api/v1/products/1/stocks/3"))
        .json(&json!({"warehouseman_id": 1, "city": "Tetouan"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{base}/api/v1/products/1/stocks/2?warehouseman_id=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let products = db.lock().unwrap();
    let cement = products.iter().find(|p| p["id"] == 1).unwrap();
    let cities: Vec<&str> = cement["stocks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["localisation"]["city"].as_str().unwrap())
        .collect();
    assert_eq!(cities, vec!["Casablanca", "Tetouan"]);
    assert_eq!(cement["editedBy"].as_array().unwrap().len(), 5);
    // The query-string editor id is stored as a number, like body ids.
    assert_eq!(cement["editedBy"][0]["warehousemanId"], json!(1));
}

#[tokio::test]
async fn removing_unknown_stock_location_is_not_found() {
    let (base, _db) = setup().await;
    let resp = Client::new()
        .delete(format!("{base}/api/v1/products/1/stocks/99?warehouseman_id=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn empty_city_is_rejected() {
    let (base, _db) = setup().await;
    let resp = Client::new()
        .post(format!("{base}/api/v1/products/1/stocks"))
        .json(&json!({
            "warehouseman_id": 1,
            "name": "Ghost",
            "city": "",
            "quantity": 1,
            "latitude": 0.0,
            "longitude": 0.0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_product_registers_with_store() {
    let (base, db) = setup().await;
    let resp = Client::new()
        .post(format!("{base}/api/v1/products"))
        .json(&json!({
            "warehouseman_id": 1,
            "name": "Gravel",
            "type": "Aggregate",
            "barcode": "888",
            "price": 2.5
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["id"].is_string());
    assert_eq!(body["data"]["editedBy"][0]["totalStock"], 0);
    assert_eq!(db.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn warehousemen_listing_hides_secret_keys() {
    let (base, _db) = setup().await;
    let (status, body) = get_json(&Client::new(), &format!("{base}/api/v1/warehousemen")).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|w| w.get("secretKey").is_none()));
    assert_eq!(list[1]["warehouseId"], 2);
}
