//! Builds parameterized SELECT/UPDATE statements from a query spec and static
//! entity metadata. Identifiers never come from request input.

use super::spec::QuerySpec;
use serde_json::Value;

/// Static description of a queryable entity. `columns` carries the PostgreSQL
/// type of each column so placeholders can be cast (`$n::double precision`),
/// since values arrive as untyped JSON.
pub struct EntityMeta {
    pub table: &'static str,
    /// (name, pg type) for every persisted column.
    pub columns: &'static [(&'static str, &'static str)],
    /// Default select list; excludes columns never shown to clients.
    pub public_columns: &'static [&'static str],
    /// Column for the default sort (descending).
    pub default_sort: &'static str,
    /// Predicate marking rows hidden from default reads.
    pub hidden: Option<&'static str>,
}

impl EntityMeta {
    fn column_type(&self, name: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| *t)
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| *n == name)
    }
}

/// Whether hidden rows (secret tours, inactive users) are excluded. Privileged
/// paths opt out explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Default,
    All,
}

/// Reference resolution for a read: either a single foreign key on the main
/// row or an array column of referenced ids.
pub enum IncludeKind {
    ToOne { fk: &'static str },
    RefArray { array_col: &'static str },
}

/// One populated reference: emitted as a scalar subquery so list reads stay a
/// single statement.
pub struct IncludeSelect {
    pub name: &'static str,
    pub kind: IncludeKind,
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub hidden: Option<&'static str>,
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Quote identifier for PostgreSQL (safe: only from static metadata).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

const MAIN_ALIAS: &str = "main";

fn include_subquery(inc: &IncludeSelect) -> String {
    let cols = inc
        .columns
        .iter()
        .map(|c| quoted(c))
        .collect::<Vec<_>>()
        .join(", ");
    let mut cond = match inc.kind {
        IncludeKind::ToOne { fk } => format!("\"id\" = {}.{}", MAIN_ALIAS, quoted(fk)),
        IncludeKind::RefArray { array_col } => {
            format!("\"id\" = ANY({}.{})", MAIN_ALIAS, quoted(array_col))
        }
    };
    if let Some(hidden) = inc.hidden {
        cond.push_str(&format!(" AND NOT ({})", hidden));
    }
    let inner = format!("SELECT {} FROM {} WHERE {}", cols, quoted(inc.table), cond);
    match inc.kind {
        IncludeKind::ToOne { .. } => {
            format!("(SELECT row_to_json(sub) FROM ({}) sub)", inner)
        }
        IncludeKind::RefArray { .. } => format!(
            "(SELECT COALESCE(json_agg(row_to_json(sub)), '[]'::json) FROM ({}) sub)",
            inner
        ),
    }
}

/// Column list for the inner select: requested fields intersected with the
/// public set (an empty intersection falls back to the full public set).
fn select_columns(meta: &EntityMeta, spec: &QuerySpec) -> Vec<String> {
    let selected: Vec<&str> = match &spec.fields {
        Some(requested) => {
            let known: Vec<&str> = requested
                .iter()
                .map(String::as_str)
                .filter(|f| meta.public_columns.contains(f))
                .collect();
            if known.is_empty() {
                meta.public_columns.to_vec()
            } else {
                known
            }
        }
        None => meta.public_columns.to_vec(),
    };
    selected
        .iter()
        .map(|c| format!("{}.{}", MAIN_ALIAS, quoted(c)))
        .collect()
}

fn where_clause(q: &mut QueryBuf, meta: &EntityMeta, spec: &QuerySpec, vis: Visibility) -> String {
    let mut parts: Vec<String> = Vec::new();
    for f in &spec.filters {
        if !meta.has_column(&f.field) {
            // no schema validation at compose time: unknown names read as
            // filters no document can match
            parts.push("1 = 0".into());
            continue;
        }
        let n = q.push_param(f.value.clone());
        let ph = match meta.column_type(&f.field) {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        };
        parts.push(format!(
            "{}.{} {} {}",
            MAIN_ALIAS,
            quoted(&f.field),
            f.op.as_sql(),
            ph
        ));
    }
    if vis == Visibility::Default {
        if let Some(hidden) = meta.hidden {
            parts.push(format!("NOT ({})", hidden));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn order_clause(meta: &EntityMeta, spec: &QuerySpec) -> String {
    let keys: Vec<String> = spec
        .sort
        .iter()
        .filter(|k| meta.has_column(&k.field))
        .map(|k| {
            format!(
                "{}.{}{}",
                MAIN_ALIAS,
                quoted(&k.field),
                if k.descending { " DESC" } else { "" }
            )
        })
        .collect();
    if keys.is_empty() {
        format!(" ORDER BY {}.{} DESC", MAIN_ALIAS, quoted(meta.default_sort))
    } else {
        format!(" ORDER BY {}", keys.join(", "))
    }
}

/// Filtered, sorted, field-limited, paginated list. The whole statement is
/// wrapped in `row_to_json` so rows come back as one JSON document each.
pub fn select_list(
    meta: &EntityMeta,
    spec: &QuerySpec,
    vis: Visibility,
    includes: &[&IncludeSelect],
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = select_columns(meta, spec);
    for inc in includes {
        cols.push(format!("{} AS {}", include_subquery(inc), quoted(inc.name)));
    }
    let where_sql = where_clause(&mut q, meta, spec, vis);
    let order_sql = order_clause(meta, spec);
    q.sql = format!(
        "SELECT row_to_json(doc) AS doc FROM (SELECT {} FROM {} {}{}{} LIMIT {} OFFSET {}) doc",
        cols.join(", "),
        quoted(meta.table),
        MAIN_ALIAS,
        where_sql,
        order_sql,
        spec.limit,
        spec.offset()
    );
    q
}

/// Single document by an exact column match (id, slug, ...). Same shape as a
/// one-row list so population and visibility apply uniformly.
pub fn select_by_column(
    meta: &EntityMeta,
    column: &str,
    value: Value,
    vis: Visibility,
    includes: &[&IncludeSelect],
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols: Vec<String> = meta
        .public_columns
        .iter()
        .map(|c| format!("{}.{}", MAIN_ALIAS, quoted(c)))
        .collect();
    for inc in includes {
        cols.push(format!("{} AS {}", include_subquery(inc), quoted(inc.name)));
    }
    let n = q.push_param(value);
    let ph = match meta.column_type(column) {
        Some(t) => format!("${}::{}", n, t),
        None => format!("${}", n),
    };
    let mut cond = format!("{}.{} = {}", MAIN_ALIAS, quoted(column), ph);
    if vis == Visibility::Default {
        if let Some(hidden) = meta.hidden {
            cond.push_str(&format!(" AND NOT ({})", hidden));
        }
    }
    q.sql = format!(
        "SELECT row_to_json(doc) AS doc FROM (SELECT {} FROM {} {} WHERE {}) doc",
        cols.join(", "),
        quoted(meta.table),
        MAIN_ALIAS,
        cond
    );
    q
}

pub fn select_by_id(
    meta: &EntityMeta,
    id: uuid::Uuid,
    vis: Visibility,
    includes: &[&IncludeSelect],
) -> QueryBuf {
    select_by_column(
        meta,
        "id",
        Value::String(id.to_string()),
        vis,
        includes,
    )
}

/// UPDATE by id: SET only known columns present in `changes`; returns the
/// updated row as one JSON document.
pub fn update_by_id(meta: &EntityMeta, id: uuid::Uuid, changes: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (col, val) in changes {
        if col == "id" || !meta.has_column(col) {
            continue;
        }
        let n = q.push_param(val.clone());
        let rhs = match meta.column_type(col) {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        };
        sets.push(format!("{} = {}", quoted(col), rhs));
    }
    let id_param = q.push_param(Value::String(id.to_string()));
    let table = quoted(meta.table);
    let returning: Vec<String> = meta.public_columns.iter().map(|c| quoted(c)).collect();
    q.sql = format!(
        "UPDATE {} SET {} WHERE \"id\" = ${}::uuid RETURNING (SELECT row_to_json(r) FROM (SELECT {}) r) AS doc",
        table,
        sets.join(", "),
        id_param,
        returning.join(", ")
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TEST_META: EntityMeta = EntityMeta {
        table: "tours",
        columns: &[
            ("id", "uuid"),
            ("name", "text"),
            ("price", "double precision"),
            ("secret_tour", "boolean"),
            ("created_at", "timestamptz"),
        ],
        public_columns: &["id", "name", "price", "created_at"],
        default_sort: "created_at",
        hidden: Some("secret_tour = TRUE"),
    };

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn gte_filter_compiles_to_comparison_with_cast() {
        let spec = QuerySpec::from_params(params(&[("price[gte]", "100")]));
        let q = select_list(&TEST_META, &spec, Visibility::Default, &[]);
        assert!(q.sql.contains("main.\"price\" >= $1::double precision"));
        assert_eq!(q.params, vec![serde_json::json!(100)]);
    }

    #[test]
    fn hidden_rows_are_excluded_by_default_and_on_demand_only() {
        let spec = QuerySpec::from_params(params(&[]));
        let q = select_list(&TEST_META, &spec, Visibility::Default, &[]);
        assert!(q.sql.contains("NOT (secret_tour = TRUE)"));
        let q = select_list(&TEST_META, &spec, Visibility::All, &[]);
        assert!(!q.sql.contains("secret_tour"));
    }

    #[test]
    fn unknown_filter_field_yields_empty_result_not_error() {
        let spec = QuerySpec::from_params(params(&[("nonexistent", "x")]));
        let q = select_list(&TEST_META, &spec, Visibility::Default, &[]);
        assert!(q.sql.contains("1 = 0"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn sort_limit_page_compile_in_fixed_pipeline_order() {
        let spec = QuerySpec::from_params(params(&[
            ("sort", "-price"),
            ("limit", "2"),
            ("page", "1"),
        ]));
        let q = select_list(&TEST_META, &spec, Visibility::Default, &[]);
        assert!(q.sql.contains("ORDER BY main.\"price\" DESC"));
        assert!(q.sql.contains("LIMIT 2 OFFSET 0"));
        // filtering precedes pagination
        let where_pos = q.sql.find("WHERE").unwrap();
        let limit_pos = q.sql.find("LIMIT").unwrap();
        assert!(where_pos < limit_pos);
    }

    #[test]
    fn default_sort_is_created_at_descending() {
        let spec = QuerySpec::from_params(params(&[]));
        let q = select_list(&TEST_META, &spec, Visibility::Default, &[]);
        assert!(q.sql.contains("ORDER BY main.\"created_at\" DESC"));
    }

    #[test]
    fn field_selection_intersects_with_public_columns() {
        let spec = QuerySpec::from_params(params(&[("fields", "name,price,secret_tour")]));
        let q = select_list(&TEST_META, &spec, Visibility::Default, &[]);
        assert!(q.sql.contains("main.\"name\""));
        assert!(q.sql.contains("main.\"price\""));
        // secret_tour is not in the public set
        assert!(!q.sql.contains("main.\"secret_tour\""));
    }

    #[test]
    fn unknown_sort_keys_are_dropped() {
        let spec = QuerySpec::from_params(params(&[("sort", "bogus")]));
        let q = select_list(&TEST_META, &spec, Visibility::Default, &[]);
        assert!(q.sql.contains("ORDER BY main.\"created_at\" DESC"));
    }

    #[test]
    fn ref_array_include_emits_json_agg_subquery() {
        let inc = IncludeSelect {
            name: "guides",
            kind: IncludeKind::RefArray {
                array_col: "guides",
            },
            table: "users",
            columns: &["id", "name"],
            hidden: Some("active = FALSE"),
        };
        let sub = include_subquery(&inc);
        assert!(sub.contains("json_agg"));
        assert!(sub.contains("\"id\" = ANY(main.\"guides\")"));
        assert!(sub.contains("NOT (active = FALSE)"));
    }

    #[test]
    fn update_skips_unknown_columns_and_id() {
        let id = uuid::Uuid::new_v4();
        let q = update_by_id(
            &TEST_META,
            id,
            &[
                ("name".into(), serde_json::json!("Sea Explorer")),
                ("id".into(), serde_json::json!("nope")),
                ("bogus".into(), serde_json::json!(1)),
            ],
        );
        assert!(q.sql.contains("\"name\" = $1::text"));
        assert!(!q.sql.contains("bogus"));
        assert_eq!(q.params.len(), 2); // name + id in WHERE
    }
}
