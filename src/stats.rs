//! Catalog statistics, computed fresh from a snapshot on every request.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::product::Product;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub count: usize,
    pub total_value: f64,
}

/// Counts and price aggregates. Categories serialize in lexical order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_products: usize,
    pub in_stock: usize,
    pub out_of_stock: usize,
    pub total_value: f64,
    pub average_price: f64,
    pub categories: BTreeMap<String, CategoryStats>,
}

/// Aggregates `snapshot`. An empty snapshot yields all zeros.
pub fn summarize(snapshot: &[Product]) -> StatsSummary {
    let mut summary = StatsSummary { total_products: snapshot.len(), ..StatsSummary::default() };

    for product in snapshot {
        if product.in_stock {
            summary.in_stock += 1;
        } else {
            summary.out_of_stock += 1;
        }
        summary.total_value += product.price;

        let entry = summary.categories.entry(product.category.clone()).or_default();
        entry.count += 1;
        entry.total_value += product.price;
    }

    if summary.total_products > 0 {
        summary.average_price = round2(summary.total_value / summary.total_products as f64);
    }
    summary.total_value = round2(summary.total_value);
    for entry in summary.categories.values_mut() {
        entry.total_value = round2(entry.total_value);
    }
    summary
}

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}
