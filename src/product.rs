//! The product record, its input shapes, and its query/validation config.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::query::{ExactFilter, FieldValue, Match, QueryConfig, Queryable, RangeFilter};
use crate::validate::FieldSpec;

/// One catalog entry. `id` is assigned by the store and never changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated create body. Defaults for optional fields are applied by
/// [`Product::create`], not here.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

/// Validated update body. `None` means "keep the stored value".
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub in_stock: Option<bool>,
}

impl NewProduct {
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, ApiError> {
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| ApiError::internal(format!("validated body did not decode: {e}")))
    }
}

impl ProductPatch {
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, ApiError> {
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| ApiError::internal(format!("validated body did not decode: {e}")))
    }
}

impl Product {
    /// Input rules for create and update bodies, in reporting order.
    pub const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::text("name").required().trim().max(100.0),
        FieldSpec::text("description").trim().max(500.0),
        FieldSpec::number("price").required().min(0.0),
        FieldSpec::text("category").required().trim().lowercase().max(50.0),
        FieldSpec::boolean("inStock"),
    ];

    /// Listing route configuration: `search` over name and description,
    /// `category`/`inStock` exact filters, `minPrice`/`maxPrice` range.
    pub const QUERY: QueryConfig = QueryConfig {
        search_fields: &["name", "description"],
        exact: &[
            ExactFilter { param: "category", field: "category", mode: Match::TextIgnoreCase },
            ExactFilter { param: "inStock", field: "inStock", mode: Match::Bool },
        ],
        ranges: &[RangeFilter { field: "price", min_param: "minPrice", max_param: "maxPrice" }],
        sortable: &["id", "name", "description", "price", "category", "inStock"],
        default_limit: QueryConfig::DEFAULT_LIMIT,
        max_limit: QueryConfig::MAX_LIMIT,
    };

    /// Builds a fresh record. `inStock` defaults to `true`, `description` to "".
    pub fn create(id: String, input: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description.unwrap_or_default(),
            price: input.price,
            category: input.category,
            in_stock: input.in_stock.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the fields present in `patch`; everything else, and `id`,
    /// stays as stored.
    pub fn apply(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(in_stock) = patch.in_stock {
            self.in_stock = in_stock;
        }
        self.updated_at = now;
    }
}

impl Queryable for Product {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id"          => Some(FieldValue::Text(&self.id)),
            "name"        => Some(FieldValue::Text(&self.name)),
            "description" => Some(FieldValue::Text(&self.description)),
            "price"       => Some(FieldValue::Number(self.price)),
            "category"    => Some(FieldValue::Text(&self.category)),
            "inStock"     => Some(FieldValue::Bool(self.in_stock)),
            _ => None,
        }
    }
}
