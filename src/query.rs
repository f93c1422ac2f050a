//! Query engine: search, filter, sort and paginate a collection snapshot.
//!
//! [`run`] is a pure function of `(snapshot, params, config)`. It never reads
//! the live store, never fails, and always produces the same page for the same
//! inputs. Stages run in a fixed order, each on the output of the previous one:
//!
//! ```text
//! snapshot ─▶ search ─▶ exact filters ─▶ range filters ─▶ sort ─▶ paginate
//!                                                   │
//!                                    totalProducts ◀┘ (counted here)
//! ```
//!
//! A missing parameter skips its stage. Malformed parameters on this read path
//! are treated as absent: a bad `minPrice` disables that bound, a bad `page`
//! falls back to 1, and so on.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::num::IntErrorKind;

use serde::Serialize;

// ── Record access ─────────────────────────────────────────────────────────────

/// A borrowed scalar read out of a record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
}

impl FieldValue<'_> {
    /// Natural ordering within one type. Values of different types compare
    /// by type rank so the ordering stays total.
    fn natural_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b))     => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Bool(a), Self::Bool(b))     => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_)   => 0,
            Self::Number(_) => 1,
            Self::Text(_)   => 2,
        }
    }
}

/// Field-level read access the engine needs from a record type.
pub trait Queryable {
    /// Returns the named field, or `None` if the record has no such field.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// How an exact-match filter compares the parameter with the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Match {
    /// Case-insensitive string equality.
    TextIgnoreCase,
    /// Parameter must be exactly `"true"` or `"false"`; anything else
    /// disables the filter.
    Bool,
}

#[derive(Clone, Copy, Debug)]
pub struct ExactFilter {
    pub param: &'static str,
    pub field: &'static str,
    pub mode: Match,
}

#[derive(Clone, Copy, Debug)]
pub struct RangeFilter {
    pub field: &'static str,
    pub min_param: &'static str,
    pub max_param: &'static str,
}

/// Which fields each stage looks at, and the paging limits.
#[derive(Clone, Copy, Debug)]
pub struct QueryConfig {
    pub search_fields: &'static [&'static str],
    pub exact: &'static [ExactFilter],
    pub ranges: &'static [RangeFilter],
    pub sortable: &'static [&'static str],
    pub default_limit: usize,
    pub max_limit: usize,
}

impl QueryConfig {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const MAX_LIMIT: usize = 100;

    /// Overrides the paging limits, keeping the field configuration.
    pub fn with_limits(mut self, default_limit: usize, max_limit: usize) -> Self {
        self.max_limit = max_limit.max(1);
        self.default_limit = default_limit.min(self.max_limit);
        self
    }
}

// ── Parameters ────────────────────────────────────────────────────────────────

/// Raw query-string parameters. The first occurrence of a key wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    /// Parses an `application/x-www-form-urlencoded` query string. An
    /// undecodable string yields no parameters rather than an error.
    pub fn parse(raw: &str) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).unwrap_or_default();
        Self::from_pairs(pairs)
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = HashMap::new();
        for (k, v) in pairs {
            map.entry(k.into()).or_insert_with(|| v.into());
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Non-empty value after trimming.
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Finite number, or `None` when absent or malformed.
    fn number(&self, key: &str) -> Option<f64> {
        self.non_empty(key)?
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
    }

    /// Non-negative integer. Values too large for `usize` saturate; negative
    /// or malformed values are `None`.
    fn count(&self, key: &str) -> Option<usize> {
        match self.non_empty(key)?.parse::<u64>() {
            Ok(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(usize::MAX),
            Err(_) => None,
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Paging facts for one query result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub current_page: usize,
    pub total_pages: usize,
    #[serde(rename = "totalProducts")]
    pub total_matching: usize,
    pub limit: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMetadata {
    fn new(current_page: usize, total_matching: usize, limit: usize) -> Self {
        let total_pages = if limit > 0 { total_matching.div_ceil(limit) } else { 0 };
        Self {
            current_page,
            total_pages,
            total_matching,
            limit,
            has_next_page: current_page < total_pages,
            has_prev_page: current_page > 1,
        }
    }
}

/// One page of records plus its metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub meta: PageMetadata,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Runs every stage over `snapshot` and returns the requested page.
pub fn run<R>(snapshot: &[R], params: &QueryParams, config: &QueryConfig) -> Page<R>
where
    R: Queryable + Clone,
{
    let mut rows: Vec<&R> = snapshot.iter().collect();

    if let Some(term) = params.non_empty("search") {
        rows = search(rows, term, config.search_fields);
    }
    for filter in config.exact {
        if let Some(value) = params.non_empty(filter.param) {
            rows = exact_match(rows, filter, value);
        }
    }
    for range in config.ranges {
        let min = params.number(range.min_param);
        let max = params.number(range.max_param);
        if min.is_some() || max.is_some() {
            rows = within(rows, range.field, min, max);
        }
    }

    if let Some(field) = params.non_empty("sortBy") {
        if config.sortable.iter().any(|known| *known == field) {
            let descending = params
                .get("order")
                .is_some_and(|o| o.trim().eq_ignore_ascii_case("desc"));
            sort(&mut rows, field, descending);
        }
    }

    let total = rows.len();
    let page = params.count("page").filter(|p| *p >= 1).unwrap_or(1);
    let limit = params
        .count("limit")
        .map_or(config.default_limit, |n| n.min(config.max_limit));

    let items = paginate(&rows, page, limit).iter().map(|r| (*r).clone()).collect();
    Page { items, meta: PageMetadata::new(page, total, limit) }
}

fn search<'a, R: Queryable>(rows: Vec<&'a R>, term: &str, fields: &[&str]) -> Vec<&'a R> {
    let needle = term.to_lowercase();
    rows.into_iter()
        .filter(|r| {
            fields.iter().any(|f| match r.field(f) {
                Some(FieldValue::Text(text)) => text.to_lowercase().contains(&needle),
                _ => false,
            })
        })
        .collect()
}

fn exact_match<'a, R: Queryable>(rows: Vec<&'a R>, filter: &ExactFilter, value: &str) -> Vec<&'a R> {
    match filter.mode {
        Match::TextIgnoreCase => {
            let wanted = value.to_lowercase();
            rows.into_iter()
                .filter(|r| matches!(r.field(filter.field), Some(FieldValue::Text(t)) if t.to_lowercase() == wanted))
                .collect()
        }
        Match::Bool => {
            let wanted = match value {
                "true" => true,
                "false" => false,
                _ => return rows,
            };
            rows.into_iter()
                .filter(|r| r.field(filter.field) == Some(FieldValue::Bool(wanted)))
                .collect()
        }
    }
}

fn within<'a, R: Queryable>(rows: Vec<&'a R>, field: &str, min: Option<f64>, max: Option<f64>) -> Vec<&'a R> {
    rows.into_iter()
        .filter(|r| match r.field(field) {
            Some(FieldValue::Number(n)) => {
                min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi)
            }
            _ => false,
        })
        .collect()
}

/// Stable sort; records lacking the field go first in ascending order.
fn sort<R: Queryable>(rows: &mut [&R], field: &str, descending: bool) {
    rows.sort_by(|a, b| {
        let ord = match (a.field(field), b.field(field)) {
            (Some(x), Some(y)) => x.natural_cmp(&y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if descending { ord.reverse() } else { ord }
    });
}

/// The half-open window `[(page-1)*limit, page*limit)`, clamped to `rows`.
fn paginate<'s, T>(rows: &'s [T], page: usize, limit: usize) -> &'s [T] {
    let start = (page - 1).saturating_mul(limit).min(rows.len());
    let end = start.saturating_add(limit).min(rows.len());
    &rows[start..end]
}
