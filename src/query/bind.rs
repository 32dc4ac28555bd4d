//! Convert serde_json::Value into types that sqlx can bind.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value bindable to a PostgreSQL placeholder, converted from JSON.
#[derive(Clone, Debug)]
pub enum BindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
    Json(Value),
}

impl BindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    BindValue::I64(i)
                } else {
                    BindValue::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => {
                if let Ok(u) = uuid::Uuid::parse_str(s) {
                    BindValue::Uuid(u)
                } else if let Ok(t) = DateTime::parse_from_rfc3339(s) {
                    BindValue::Timestamp(t.with_timezone(&Utc))
                } else {
                    BindValue::Text(s.clone())
                }
            }
            Value::Array(_) | Value::Object(_) => BindValue::Json(v.clone()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for BindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            BindValue::Null => <Option<i32> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            BindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            BindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            BindValue::Text(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            BindValue::Uuid(u) => {
                let u_str = u.to_string();
                <&str as Encode<Postgres>>::encode_by_ref(&u_str.as_str(), buf)?
            }
            BindValue::Timestamp(t) => {
                let t_str = t.to_rfc3339();
                <&str as Encode<Postgres>>::encode_by_ref(&t_str.as_str(), buf)?
            }
            BindValue::Json(v) => <serde_json::Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }
}

impl sqlx::Type<Postgres> for BindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_map_to_native_binds() {
        assert!(matches!(BindValue::from_json(&json!(null)), BindValue::Null));
        assert!(matches!(BindValue::from_json(&json!(true)), BindValue::Bool(true)));
        assert!(matches!(BindValue::from_json(&json!(7)), BindValue::I64(7)));
        assert!(matches!(BindValue::from_json(&json!(4.5)), BindValue::F64(_)));
        assert!(matches!(
            BindValue::from_json(&json!("easy")),
            BindValue::Text(_)
        ));
    }

    #[test]
    fn uuid_strings_bind_as_uuid() {
        let v = json!("7b7bd0d2-3c85-4f34-8b3a-1d4a3f1a2b3c");
        assert!(matches!(BindValue::from_json(&v), BindValue::Uuid(_)));
    }
}
