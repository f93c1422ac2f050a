use std::sync::Arc;

use catalog::{Config, MemoryStore, Method, NewProduct, Product, ProductStore, Request, Router, Server, app};
use chrono::Utc;
use serde_json::{Value, json};

const KEY: &str = "test-key";

fn product(id: &str, name: &str, price: f64, category: &str, in_stock: bool) -> Product {
    Product::create(
        id.to_string(),
        NewProduct {
            name: name.to_string(),
            description: Some(format!("{name} description")),
            price,
            category: category.to_string(),
            in_stock: Some(in_stock),
        },
        Utc::now(),
    )
}

/// Serves `router` on an OS-assigned port and returns the base URL.
async fn spawn_router(server: fn(tokio::net::TcpListener) -> Server, router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        server(listener)
            .serve_with_shutdown(router, std::future::pending())
            .await
            .unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

/// Spin up the full catalog app, returning the base URL and a handle on the
/// store.
async fn spawn_test_server(products: Vec<Product>) -> (String, Arc<MemoryStore>) {
    let config = Config { api_key: KEY.to_string(), ..Config::default() };
    let store = Arc::new(MemoryStore::with_products(products));
    let router = app::build(&config, store.clone());
    (spawn_router(Server::from_listener, router).await, store)
}

async fn get_json(url: String) -> (u16, Value) {
    let resp = reqwest::get(url).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

fn prices(body: &Value) -> Vec<f64> {
    body["data"].as_array().unwrap().iter()
        .map(|p| p["price"].as_f64().unwrap())
        .collect()
}

#[tokio::test]
async fn listing_filters_sorts_and_paginates() {
    let (base, _) = spawn_test_server(vec![
        product("1", "Fork", 50.0, "a", true),
        product("2", "Plate", 150.0, "b", true),
        product("3", "Pan", 300.0, "a", false),
    ]).await;

    let (status, body) = get_json(format!(
        "{base}/api/products?minPrice=100&sortBy=price&order=desc&page=1&limit=10"
    )).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(prices(&body), vec![300.0, 150.0]);
    assert_eq!(body["pagination"], json!({
        "currentPage": 1,
        "totalPages": 1,
        "totalProducts": 2,
        "limit": 10,
        "hasNextPage": false,
        "hasPrevPage": false,
    }));
}

#[tokio::test]
async fn search_is_case_insensitive_over_http() {
    let (base, _) = spawn_test_server(vec![
        product("1", "Laptop", 999.0, "tech", true),
        product("2", "Mouse", 20.0, "tech", true),
    ]).await;

    let (_, body) = get_json(format!("{base}/api/products?search=LAPTOP")).await;
    let names: Vec<&str> = body["data"].as_array().unwrap().iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Laptop"]);
}

#[tokio::test]
async fn malformed_numbers_do_not_fail_listing() {
    let (base, _) = spawn_test_server(vec![product("1", "Cup", 5.0, "k", true)]).await;
    let (status, body) = get_json(format!("{base}/api/products?minPrice=cheap&page=abc&limit=-1")).await;
    assert_eq!(status, 200);
    assert_eq!(prices(&body), vec![5.0]);
    assert_eq!(body["pagination"]["currentPage"], 1);
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let (base, _) = spawn_test_server(vec![product("1", "Cup", 5.0, "k", true)]).await;
    let (status, body) = get_json(format!("{base}/api/products?page=5")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["hasNextPage"], false);
}

#[tokio::test]
async fn stats_route_takes_precedence_over_id() {
    let (base, _) = spawn_test_server(vec![
        product("1", "Fork", 50.0, "a", true),
        product("2", "Pan", 150.0, "a", false),
    ]).await;
    let (status, body) = get_json(format!("{base}/api/products/stats")).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["totalProducts"], 2);
    assert_eq!(body["data"]["inStock"], 1);
    assert_eq!(body["data"]["averagePrice"].as_f64(), Some(100.0));
    assert_eq!(body["data"]["categories"]["a"]["count"], 2);
}

#[tokio::test]
async fn stats_on_empty_catalog_average_is_zero() {
    let (base, _) = spawn_test_server(vec![]).await;
    let (_, body) = get_json(format!("{base}/api/products/stats")).await;
    assert_eq!(body["data"]["averagePrice"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn unknown_product_is_404_envelope() {
    let (base, _) = spawn_test_server(vec![]).await;
    let (status, body) = get_json(format!("{base}/api/products/missing")).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"success": false, "error": "Product not found"}));
}

#[tokio::test]
async fn unknown_route_is_404_envelope() {
    let (base, _) = spawn_test_server(vec![]).await;
    let (status, body) = get_json(format!("{base}/api/nope")).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn writes_require_api_key() {
    let (base, store) = spawn_test_server(vec![]).await;
    let client = reqwest::Client::new();
    let body = json!({"name": "Pen", "price": 2, "category": "office"});

    let resp = client.post(format!("{base}/api/products")).json(&body).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "API key is required");

    let resp = client.post(format!("{base}/api/products"))
        .header("x-api-key", "wrong")
        .json(&body)
        .send().await.unwrap();
    assert_eq!(resp.status(), 401);
    let err: Value = resp.json().await.unwrap();
    assert_eq!(err["error"], "Invalid API key");

    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn auth_runs_before_validation() {
    let (base, _) = spawn_test_server(vec![]).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/products"))
        .body("not json")
        .send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn create_validates_all_fields() {
    let (base, store) = spawn_test_server(vec![]).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/products"))
        .header("x-api-key", KEY)
        .json(&json!({"name": "", "price": -1, "category": "x"}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "name cannot be empty, price must be a non-negative number");
    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn create_returns_201_with_generated_id() {
    let (base, store) = spawn_test_server(vec![]).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/products"))
        .header("x-api-key", KEY)
        .json(&json!({"id": "mine", "name": "  Pen ", "price": 2.5, "category": "Office", "extra": 1}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_ne!(data["id"], "mine");
    assert_eq!(data["name"], "Pen");
    assert_eq!(data["category"], "office");
    assert_eq!(data["inStock"], true);
    assert!(data.get("extra").is_none());
    assert_eq!(store.list().unwrap().len(), 1);
}

#[tokio::test]
async fn update_merges_partial_body() {
    let (base, store) = spawn_test_server(vec![product("p1", "Desk", 100.0, "home", true)]).await;
    let resp = reqwest::Client::new()
        .put(format!("{base}/api/products/p1"))
        .header("x-api-key", KEY)
        .json(&json!({"price": 120}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let stored = store.get("p1").unwrap();
    assert_eq!(stored.price, 120.0);
    assert!(stored.in_stock);
    assert_eq!(stored.name, "Desk");
}

#[tokio::test]
async fn patch_behaves_like_put() {
    let (base, store) = spawn_test_server(vec![product("p1", "Desk", 100.0, "home", true)]).await;
    let resp = reqwest::Client::new()
        .patch(format!("{base}/api/products/p1"))
        .header("x-api-key", KEY)
        .json(&json!({"inStock": false}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(!store.get("p1").unwrap().in_stock);
}

#[tokio::test]
async fn update_unknown_id_is_404() {
    let (base, _) = spawn_test_server(vec![]).await;
    let resp = reqwest::Client::new()
        .put(format!("{base}/api/products/ghost"))
        .header("x-api-key", KEY)
        .json(&json!({"price": 1}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn delete_removes_product() {
    let (base, store) = spawn_test_server(vec![product("p1", "Desk", 100.0, "home", true)]).await;
    let client = reqwest::Client::new();

    let resp = client.delete(format!("{base}/api/products/p1"))
        .header("x-api-key", KEY)
        .send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], "p1");
    assert!(store.list().unwrap().is_empty());

    let resp = client.delete(format!("{base}/api/products/p1"))
        .header("x-api-key", KEY)
        .send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn health_probes_answer() {
    let (base, _) = spawn_test_server(vec![]).await;
    let live = reqwest::get(format!("{base}/healthz")).await.unwrap();
    assert_eq!(live.status(), 200);
    assert_eq!(live.text().await.unwrap(), "ok");
    let ready = reqwest::get(format!("{base}/readyz")).await.unwrap();
    assert_eq!(ready.text().await.unwrap(), "ready");
}

#[tokio::test]
async fn handler_panic_becomes_internal_error() {
    async fn explode(_req: Request) -> &'static str {
        panic!("handler blew up");
    }

    let router = Router::new().on(Method::Get, "/explode", explode);
    let base = spawn_router(Server::from_listener, router).await;

    let (status, body) = get_json(format!("{base}/explode")).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({"success": false, "error": "Internal server error"}));

    // The connection task survived; the server keeps answering.
    let (status, _) = get_json(format!("{base}/explode")).await;
    assert_eq!(status, 500);
}

#[tokio::test]
async fn oversized_body_is_refused_before_auth() {
    let config = Config { api_key: KEY.to_string(), ..Config::default() };
    let store = Arc::new(MemoryStore::new());
    let router = app::build(&config, store.clone());
    let base = spawn_router(|l| Server::from_listener(l).body_limit(64), router).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/products"))
        .body("x".repeat(1024))
        .send().await.unwrap();
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "error": "Request body exceeds 64 bytes"}));
    assert!(store.list().unwrap().is_empty());

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/products"))
        .header("x-api-key", KEY)
        .json(&json!({"name": "Pen", "price": 2, "category": "x"}))
        .send().await.unwrap();
    assert_eq!(resp.status(), 201);
}
