//! Read-query composition: untrusted request parameters into a query
//! specification, then into parameterized SQL. Identifiers come only from
//! static entity metadata; every value is bound as a parameter.

mod bind;
mod builder;
mod exec;
mod spec;

pub use bind::BindValue;
pub use builder::{
    select_by_column, select_by_id, select_list, update_by_id, EntityMeta, IncludeKind,
    IncludeSelect, QueryBuf, Visibility,
};
pub use exec::{fetch_all_docs, fetch_optional_doc};
pub use spec::{Filter, Op, QuerySpec, SortKey};
