//! Row query model shared by every backend.
//!
//! A [`Query`] is a conjunction of column filters plus an ordering and an
//! optional limit - the subset of the hosted row API the application uses.
//! The remote backend renders it into PostgREST query parameters; the local
//! backend evaluates it in-process with the same SQL semantics.

use serde_json::Value;
use std::cmp::Ordering;

/// A single column predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`; a JSON null means `column IS NULL`.
    Eq(String, Value),
    /// `column <> value` (rows where the column is null never match).
    Neq(String, Value),
    /// `column IN (values...)`.
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::Eq(column.to_string(), value.into())
    }

    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _) | Self::Neq(c, _) | Self::In(c, _) => c,
        }
    }

    /// Evaluate against a JSON row object.
    pub fn matches(&self, row: &Value) -> bool {
        let cell = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Self::Eq(_, Value::Null) => cell.is_null(),
            Self::Eq(_, expected) => values_equal(cell, expected),
            Self::Neq(_, Value::Null) => !cell.is_null(),
            Self::Neq(_, expected) => !cell.is_null() && !values_equal(cell, expected),
            Self::In(_, options) => {
                !cell.is_null() && options.iter().any(|o| values_equal(cell, o))
            }
        }
    }

    /// PostgREST `(column, operator.value)` pair.
    pub fn to_param(&self) -> (String, String) {
        let rendered = match self {
            Self::Eq(_, Value::Null) => "is.null".to_string(),
            Self::Eq(_, v) => format!("eq.{}", render_scalar(v)),
            Self::Neq(_, Value::Null) => "not.is.null".to_string(),
            Self::Neq(_, v) => format!("neq.{}", render_scalar(v)),
            Self::In(_, values) => {
                let items: Vec<String> = values.iter().map(render_list_item).collect();
                format!("in.({})", items.join(","))
            }
        };
        (self.column().to_string(), rendered)
    }
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Filters, ordering and limit for a `select`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn neq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Neq(column.to_string(), value.into()));
        self
    }

    pub fn in_list<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Compare two rows by this query's ordering.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for key in &self.order {
            let left = a.get(&key.column).unwrap_or(&Value::Null);
            let right = b.get(&key.column).unwrap_or(&Value::Null);
            let ord = compare_for_sort(left, right, key.ascending);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Full PostgREST query string parameters, including `select=*`.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

// ============================================================================
// Value helpers
// ============================================================================

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn render_scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_list_item(v: &Value) -> String {
    match v {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

/// SQL-like ordering: nulls sort last ascending and first descending.
fn compare_for_sort(a: &Value, b: &Value, ascending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => {
            if ascending {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, true) => {
            if ascending {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, false) => {
            let ord = compare_values(a, b);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
