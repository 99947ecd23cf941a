//! Common serde helpers for handling values from SurrealDB
//!
//! Record ids are numeric (`table:⟨i64⟩`) but arrive in three shapes
//! depending on where the value came from:
//! - SurrealDB 原生格式 (来自数据库)
//! - 字符串格式 "table:id" (来自 API JSON)
//! - 纯数字 (round-trip through plain JSON)
//!
//! The helpers below normalize all three to `i64` and always serialize
//! back out as a plain number.

use serde::{Deserialize, Deserializer, Serializer};
use surrealdb::RecordId;

/// Deserialize bool that treats null as true
pub fn bool_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|opt| opt.unwrap_or(true))
}

pub fn default_true() -> bool {
    true
}

/// 内部辅助：同时支持数字、字符串和原生 RecordId 格式
#[derive(Debug, Clone, Copy)]
struct FlexibleKey(i64);

impl<'de> Deserialize<'de> for FlexibleKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct FlexibleVisitor;

        impl<'de> Visitor<'de> for FlexibleVisitor {
            type Value = FlexibleKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an integer, a string 'table:id', or a RecordId")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexibleKey(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FlexibleKey(value as i64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                // Accept both "table:4" and bare "4"
                let key = value.rsplit(':').next().unwrap_or(value);
                key.parse::<i64>()
                    .map(FlexibleKey)
                    .map_err(|_| de::Error::custom(format!("invalid record key: {value}")))
            }

            fn visit_map<M>(self, map: M) -> Result<Self::Value, M::Error>
            where
                M: de::MapAccess<'de>,
            {
                // 委托给 RecordId 原生反序列化
                let id = RecordId::deserialize(de::value::MapAccessDeserializer::new(map))?;
                id.key()
                    .to_string()
                    .parse::<i64>()
                    .map(FlexibleKey)
                    .map_err(|_| de::Error::custom(format!("non-numeric record key: {id}")))
            }
        }

        deserializer.deserialize_any(FlexibleVisitor)
    }
}

/// Record key (de)serialization as a plain i64
pub mod record_key {
    use super::*;

    pub fn serialize<S>(id: &i64, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_i64(*id)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        FlexibleKey::deserialize(d).map(|f| f.0)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(with = "super::record_key")]
        id: i64,
    }

    #[test]
    fn accepts_plain_number() {
        let row: Row = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(row.id, 7);
    }

    #[test]
    fn accepts_table_prefixed_string() {
        let row: Row = serde_json::from_str(r#"{"id": "ticket:42"}"#).unwrap();
        assert_eq!(row.id, 42);
    }

    #[test]
    fn rejects_non_numeric_key() {
        assert!(serde_json::from_str::<Row>(r#"{"id": "ticket:abc"}"#).is_err());
    }
}
