//! Product resource handlers.
//!
//! Each handler reads or writes the store once, then hands a snapshot to the
//! pure query/stats functions. Write handlers rely on the route chain having
//! run [`ValidateBody`](crate::middleware::ValidateBody); they take the
//! normalized fields from the request instead of touching the raw body.

use std::sync::Arc;

use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::product::{NewProduct, Product, ProductPatch};
use crate::query;
use crate::request::Request;
use crate::response::Envelope;
use crate::stats::{self, StatsSummary};

type Reply<T> = Result<Envelope<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// `GET /`
pub async fn index(_state: Arc<AppState>, _req: Request) -> Reply<ServiceInfo> {
    Ok(Envelope::ok(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /api/products`: search, filter, sort and paginate.
pub async fn list(state: Arc<AppState>, req: Request) -> Reply<Vec<Product>> {
    let snapshot = state.store.list()?;
    let page = query::run(&snapshot, req.query(), &state.query);
    Ok(Envelope::ok(page.items).with_pagination(page.meta))
}

/// `GET /api/products/stats`
pub async fn stats(state: Arc<AppState>, _req: Request) -> Reply<StatsSummary> {
    let snapshot = state.store.list()?;
    Ok(Envelope::ok(stats::summarize(&snapshot)))
}

/// `GET /api/products/{id}`
pub async fn show(state: Arc<AppState>, req: Request) -> Reply<Product> {
    let id = product_id(&req)?;
    Ok(Envelope::ok(state.store.get(id)?))
}

/// `POST /api/products` → 201.
pub async fn create(state: Arc<AppState>, mut req: Request) -> Reply<Product> {
    let input = NewProduct::from_fields(validated(&mut req)?)?;
    let product = state.store.insert(input)?;
    Ok(Envelope::created(product))
}

/// `PUT|PATCH /api/products/{id}`: fields absent from the body keep their
/// stored values.
pub async fn update(state: Arc<AppState>, mut req: Request) -> Reply<Product> {
    let patch = ProductPatch::from_fields(validated(&mut req)?)?;
    let id = product_id(&req)?;
    Ok(Envelope::ok(state.store.update(id, patch)?))
}

/// `DELETE /api/products/{id}`: returns the removed record.
pub async fn remove(state: Arc<AppState>, req: Request) -> Reply<Product> {
    let id = product_id(&req)?;
    Ok(Envelope::ok(state.store.delete(id)?))
}

fn product_id(req: &Request) -> Result<&str, ApiError> {
    req.param("id").ok_or_else(|| ApiError::not_found("Product not found"))
}

fn validated(req: &mut Request) -> Result<serde_json::Map<String, serde_json::Value>, ApiError> {
    req.take_validated()
        .ok_or_else(|| ApiError::internal("route is missing body validation"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::method::Method;
    use crate::middleware::{Flow, Stage, ValidateBody};
    use crate::query::QueryConfig;
    use crate::response::IntoResponse;
    use crate::store::{MemoryStore, ProductStore};

    fn state_with(products: Vec<Product>) -> Arc<AppState> {
        Arc::new(AppState {
            store: Arc::new(MemoryStore::with_products(products)),
            query: Product::QUERY,
        })
    }

    fn product(id: &str, price: f64, category: &str) -> Product {
        Product::create(
            id.into(),
            NewProduct {
                name: format!("item {id}"),
                price,
                category: category.into(),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    fn validated_request(method: Method, body: &str, schema_stage: ValidateBody) -> Request {
        let mut req = Request::mock(method, "/api/products").with_body(body);
        assert_eq!(schema_stage.run(&mut req), Flow::Next);
        req
    }

    fn unwrap<T>(reply: Reply<T>) -> Envelope<T> {
        match reply {
            Ok(env) => env,
            Err(e) => panic!("handler failed: {e}"),
        }
    }

    #[tokio::test]
    async fn list_applies_query() {
        let state = state_with(vec![
            product("1", 50.0, "a"),
            product("2", 150.0, "b"),
            product("3", 300.0, "a"),
        ]);
        let req = Request::mock(Method::Get, "/api/products")
            .with_query("minPrice=100&sortBy=price&order=desc&page=1&limit=10");
        let resp = IntoResponse::into_response(list(state, req).await);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        let prices: Vec<f64> = body["data"].as_array().unwrap().iter()
            .map(|p| p["price"].as_f64().unwrap())
            .collect();
        assert_eq!(prices, vec![300.0, 150.0]);
        assert_eq!(body["pagination"]["totalProducts"], 2);
        assert_eq!(body["pagination"]["totalPages"], 1);
        assert_eq!(body["pagination"]["hasNextPage"], false);
    }

    #[tokio::test]
    async fn show_missing_is_not_found() {
        let state = state_with(vec![]);
        let req = Request::mock(Method::Get, "/api/products/x").with_param("id", "x");
        assert_eq!(show(state, req).await.unwrap_err(), ApiError::not_found("Product not found"));
    }

    #[tokio::test]
    async fn create_defaults_in_stock() {
        let state = state_with(vec![]);
        let req = validated_request(
            Method::Post,
            r#"{"name":"Pen","price":2,"category":"Office","id":"forced"}"#,
            ValidateBody::create(Product::SCHEMA),
        );
        let created = unwrap(create(state.clone(), req).await).into_response();
        assert_eq!(created.status_code(), crate::Status::Created);
        let stored = state.store.list().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].in_stock);
        assert_eq!(stored[0].category, "office");
        assert_ne!(stored[0].id, "forced");
    }

    #[tokio::test]
    async fn update_merges_partially() {
        let mut original = product("p1", 100.0, "home");
        original.in_stock = true;
        let state = state_with(vec![original]);
        let req = validated_request(Method::Put, r#"{"price":120}"#, ValidateBody::update(Product::SCHEMA))
            .with_param("id", "p1");
        unwrap(update(state.clone(), req).await);
        let stored = state.store.get("p1").unwrap();
        assert_eq!(stored.price, 120.0);
        assert!(stored.in_stock);
        assert_eq!(stored.name, "item p1");
    }

    #[tokio::test]
    async fn update_without_validation_stage_is_internal() {
        let state = state_with(vec![product("p1", 1.0, "a")]);
        let req = Request::mock(Method::Put, "/api/products/p1").with_param("id", "p1");
        assert!(matches!(update(state, req).await, Err(ApiError::Internal(_))));
    }

    #[tokio::test]
    async fn remove_deletes_and_returns_record() {
        let state = state_with(vec![product("p1", 1.0, "a")]);
        let req = Request::mock(Method::Delete, "/api/products/p1").with_param("id", "p1");
        unwrap(remove(state.clone(), req).await);
        assert!(state.store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_on_empty_store() {
        let state = Arc::new(AppState {
            store: Arc::new(MemoryStore::new()),
            query: Product::QUERY.with_limits(QueryConfig::DEFAULT_LIMIT, QueryConfig::MAX_LIMIT),
        });
        let resp = IntoResponse::into_response(stats(state, Request::mock(Method::Get, "/")).await);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["data"]["averagePrice"].as_f64(), Some(0.0));
        assert_eq!(body["success"], true);
    }
}
