//! Query specification assembled from untrusted request parameters.
//!
//! Stages run in a fixed order (filter, sort, limit_fields, paginate); each
//! consumes the spec and returns it with one more facet filled in, so the
//! fully-assembled value is an explicit struct rather than a mutated query.

use serde_json::Value;
use std::collections::HashMap;

/// Parameter names reserved for non-filter features.
const RESERVED: &[&str] = &["page", "sort", "limit", "fields"];

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 100;

/// Comparison operator carried by a filter. Spelled as a bracket suffix on the
/// parameter name, e.g. `price[gte]=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "gt" => Some(Op::Gt),
            "gte" => Some(Op::Gte),
            "lt" => Some(Op::Lt),
            "lte" => Some(Op::Lte),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

#[derive(Clone, Debug, Default)]
pub struct QuerySpec {
    raw: HashMap<String, String>,
    pub filters: Vec<Filter>,
    pub sort: Vec<SortKey>,
    /// Requested include-list; `None` means the entity's default column set.
    pub fields: Option<Vec<String>>,
    pub page: u32,
    pub limit: u32,
}

impl QuerySpec {
    pub fn new(params: HashMap<String, String>) -> Self {
        QuerySpec {
            raw: params,
            filters: Vec::new(),
            sort: Vec::new(),
            fields: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }

    /// All four stages in the required order.
    pub fn from_params(params: HashMap<String, String>) -> Self {
        Self::new(params).filter().sort().limit_fields().paginate()
    }

    /// Every non-reserved parameter becomes a conjunct. `name[gte]=v` style
    /// suffixes select a comparison operator; everything else is exact match.
    /// No schema validation happens here.
    pub fn filter(mut self) -> Self {
        for (key, value) in &self.raw {
            let (field, op) = parse_filter_key(key);
            if RESERVED.contains(&field) {
                continue;
            }
            self.filters.push(Filter {
                field: field.to_string(),
                op,
                value: coerce_scalar(value),
            });
        }
        // deterministic order for stable SQL and tests
        self.filters.sort_by(|a, b| a.field.cmp(&b.field));
        self
    }

    /// Comma-separated sort keys, `-` prefix for descending. An empty result
    /// means the caller should fall back to the entity default.
    pub fn sort(mut self) -> Self {
        if let Some(sort) = self.raw.get("sort") {
            self.sort = sort
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|key| match key.strip_prefix('-') {
                    Some(rest) => SortKey {
                        field: rest.to_string(),
                        descending: true,
                    },
                    None => SortKey {
                        field: key.to_string(),
                        descending: false,
                    },
                })
                .collect();
        }
        self
    }

    /// Comma-separated include-list of fields.
    pub fn limit_fields(mut self) -> Self {
        if let Some(fields) = self.raw.get("fields") {
            self.fields = Some(
                fields
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        self
    }

    /// Positive integers with defaults on missing or non-numeric input.
    /// An out-of-range page is kept as-is; it yields an empty page downstream.
    pub fn paginate(mut self) -> Self {
        self.page = parse_positive(self.raw.get("page")).unwrap_or(DEFAULT_PAGE);
        self.limit = parse_positive(self.raw.get("limit")).unwrap_or(DEFAULT_LIMIT);
        self
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(v: Option<&String>) -> Option<u32> {
    v.and_then(|s| s.parse::<u32>().ok()).filter(|n| *n > 0)
}

/// Split `price[gte]` into ("price", Gte). Unknown or absent suffixes mean
/// exact match on the full key.
fn parse_filter_key(key: &str) -> (&str, Op) {
    if let Some(open) = key.find('[') {
        if let Some(rest) = key[open + 1..].strip_suffix(']') {
            if let Some(op) = Op::from_suffix(rest) {
                return (&key[..open], op);
            }
        }
    }
    (key, Op::Eq)
}

/// Query string values are untyped; try integer, float, bool, else string.
fn coerce_scalar(s: &str) -> Value {
    if let Ok(n) = s.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = s.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(s.to_string())
}
