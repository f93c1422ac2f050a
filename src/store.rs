//! Storage interface and the in-memory reference backend.
//!
//! Handlers only talk to [`ProductStore`]. Reads hand out a cloned snapshot so
//! a query or aggregation never observes a write halfway through.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::product::{NewProduct, Product, ProductPatch};

/// Collection storage.
pub trait ProductStore: Send + Sync + 'static {
    /// Point-in-time copy of the whole collection.
    fn list(&self) -> Result<Vec<Product>, ApiError>;

    fn get(&self, id: &str) -> Result<Product, ApiError>;

    /// Stores a new record under a freshly generated id.
    fn insert(&self, input: NewProduct) -> Result<Product, ApiError>;

    /// Merges `patch` into the record stored under `id` and returns the
    /// result. The merge sees the current record, never a stale copy.
    fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, ApiError>;

    /// Removes and returns the record.
    fn delete(&self, id: &str) -> Result<Product, ApiError>;
}

fn not_found() -> ApiError {
    ApiError::not_found("Product not found")
}

/// `Vec` behind a `RwLock`: many concurrent readers, one exclusive writer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: RwLock<Vec<Product>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self { products: RwLock::new(products) }
    }

    /// A small demo catalog for local runs.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let demo = [
            ("Laptop", "14 inch ultrabook with 16GB RAM", 999.99, "electronics", true),
            ("Wireless Mouse", "Ergonomic mouse with USB receiver", 29.99, "electronics", true),
            ("Coffee Mug", "Ceramic mug, 350ml", 12.5, "kitchen", true),
            ("Standing Desk", "Height adjustable desk", 449.0, "furniture", false),
            ("Desk Lamp", "LED lamp with dimmer", 39.95, "furniture", true),
        ];
        let products = demo
            .into_iter()
            .map(|(name, description, price, category, in_stock)| {
                Product::create(
                    Uuid::new_v4().to_string(),
                    NewProduct {
                        name: name.to_owned(),
                        description: Some(description.to_owned()),
                        price,
                        category: category.to_owned(),
                        in_stock: Some(in_stock),
                    },
                    now,
                )
            })
            .collect();
        Self::with_products(products)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Product>>, ApiError> {
        self.products.read().map_err(|_| ApiError::internal("storage lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Product>>, ApiError> {
        self.products.write().map_err(|_| ApiError::internal("storage lock poisoned"))
    }
}

impl ProductStore for MemoryStore {
    fn list(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.read()?.clone())
    }

    fn get(&self, id: &str) -> Result<Product, ApiError> {
        self.read()?
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    fn insert(&self, input: NewProduct) -> Result<Product, ApiError> {
        let product = Product::create(Uuid::new_v4().to_string(), input, Utc::now());
        self.write()?.push(product.clone());
        Ok(product)
    }

    fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, ApiError> {
        let mut products = self.write()?;
        let slot = products.iter_mut().find(|p| p.id == id).ok_or_else(not_found)?;
        slot.apply(patch, Utc::now());
        Ok(slot.clone())
    }

    fn delete(&self, id: &str) -> Result<Product, ApiError> {
        let mut products = self.write()?;
        let index = products.iter().position(|p| p.id == id).ok_or_else(not_found)?;
        Ok(products.remove(index))
    }
}
