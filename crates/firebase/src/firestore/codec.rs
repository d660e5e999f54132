//! Firestore typed values.
//!
//! The REST API wraps every field in a tagged value
//! (`{"stringValue": "Milk"}`, `{"integerValue": "30"}`). Documents are
//! exposed to the rest of the crate as plain JSON, so values are converted
//! at the boundary:
//!
//! - integers travel as decimal strings and decode to JSON numbers
//! - timestamps decode to RFC 3339 strings; RFC 3339 strings encode back
//!   to timestamps so records with `DateTime` fields round-trip
//! - references and bytes decode to their string form

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value as Json};

use crate::store::Fields;

/// A Firestore field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(#[serde(deserialize_with = "integer_string")] String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(GeoPoint),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// Array contents. Empty arrays omit `values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Map contents. Empty maps omit `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

/// Integers are strings on the wire; some emulators send numbers.
fn integer_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(n) => n.to_string(),
    })
}

impl Value {
    /// Convert to plain JSON.
    #[must_use]
    pub fn into_json(self) -> Json {
        match self {
            Self::NullValue(()) => Json::Null,
            Self::BooleanValue(b) => Json::Bool(b),
            Self::IntegerValue(text) => text
                .parse::<i64>()
                .map_or(Json::String(text), |n| Json::Number(n.into())),
            Self::DoubleValue(d) => Number::from_f64(d).map_or(Json::Null, Json::Number),
            Self::TimestampValue(s)
            | Self::StringValue(s)
            | Self::BytesValue(s)
            | Self::ReferenceValue(s) => Json::String(s),
            Self::GeoPointValue(point) => serde_json::json!({
                "latitude": point.latitude,
                "longitude": point.longitude,
            }),
            Self::ArrayValue(array) => {
                Json::Array(array.values.into_iter().map(Self::into_json).collect())
            }
            Self::MapValue(map) => Json::Object(decode_fields(map.fields)),
        }
    }

    /// Convert from plain JSON.
    #[must_use]
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Self::NullValue(()),
            Json::Bool(b) => Self::BooleanValue(*b),
            Json::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    Self::IntegerValue(n.to_string())
                } else {
                    Self::DoubleValue(n.as_f64().unwrap_or_default())
                }
            }
            Json::String(s) => {
                if DateTime::parse_from_rfc3339(s).is_ok() {
                    Self::TimestampValue(s.clone())
                } else {
                    Self::StringValue(s.clone())
                }
            }
            Json::Array(items) => Self::ArrayValue(ArrayValue {
                values: items.iter().map(Self::from_json).collect(),
            }),
            Json::Object(fields) => Self::MapValue(MapValue {
                fields: encode_fields(fields),
            }),
        }
    }
}

/// Decode a document's `fields` into plain JSON.
#[must_use]
pub fn decode_fields(fields: BTreeMap<String, Value>) -> Fields {
    fields
        .into_iter()
        .map(|(name, value)| (name, value.into_json()))
        .collect()
}

/// Encode plain JSON fields for a write.
#[must_use]
pub fn encode_fields(fields: &Fields) -> BTreeMap<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), Value::from_json(value)))
        .collect()
}

/// Quote a field name for use in a field path when it is not a plain
/// identifier.
#[must_use]
pub fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        name.to_owned()
    } else {
        let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
        format!("`{escaped}`")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_rest_document_fields() {
        let wire: BTreeMap<String, Value> = serde_json::from_value(json!({
            "name": { "stringValue": "Milk" },
            "price": { "integerValue": "30" },
            "rating": { "doubleValue": 4.5 },
            "imageUrl": { "nullValue": null },
            "createdAt": { "timestampValue": "2024-05-01T10:00:00.123456Z" },
            "items": { "arrayValue": { "values": [
                { "mapValue": { "fields": { "qty": { "integerValue": "2" } } } }
            ] } },
            "tags": { "arrayValue": {} },
        }))
        .unwrap();

        let fields = decode_fields(wire);
        assert_eq!(
            Json::Object(fields),
            json!({
                "name": "Milk",
                "price": 30,
                "rating": 4.5,
                "imageUrl": null,
                "createdAt": "2024-05-01T10:00:00.123456Z",
                "items": [{ "qty": 2 }],
                "tags": [],
            })
        );
    }

    #[test]
    fn test_encodes_json_for_writes() {
        let Json::Object(fields) = json!({
            "isClosed": true,
            "deliveryCharge": 20,
            "supportNumber": "8090315246",
            "nextOpenTime": "2024-05-02T03:30:00Z",
        }) else {
            unreachable!()
        };

        let encoded = serde_json::to_value(encode_fields(&fields)).unwrap();
        assert_eq!(
            encoded,
            json!({
                "deliveryCharge": { "integerValue": "20" },
                "isClosed": { "booleanValue": true },
                "nextOpenTime": { "timestampValue": "2024-05-02T03:30:00Z" },
                "supportNumber": { "stringValue": "8090315246" },
            })
        );
    }

    #[test]
    fn test_integer_value_accepts_numbers() {
        let value: Value = serde_json::from_value(json!({ "integerValue": 7 })).unwrap();
        assert_eq!(value.into_json(), json!(7));
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("createdAt"), "createdAt");
        assert_eq!(field_path("_id2"), "_id2");
        assert_eq!(field_path("unit price"), "`unit price`");
        assert_eq!(field_path("2nd"), "`2nd`");
    }
}
