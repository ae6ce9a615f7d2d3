//! Row coercion
//!
//! Converts `insertAll` JSON payloads into typed rows according to the
//! table schema, and typed values back into the stringified wire format.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::types::{Field, FieldType, Row, Value};

/// Coerce one JSON object into a stored row
///
/// Only declared fields are read. Unknown keys are dropped and missing
/// fields are stored as `Null`.
pub fn coerce_row(fields: &[Field], input: &Map<String, JsonValue>) -> Result<Row> {
    fields
        .iter()
        .map(|field| {
            let value = coerce_value(field, input.get(&field.name))?;
            Ok::<_, Error>((field.name.clone(), value))
        })
        .collect()
}

/// Coerce a single JSON scalar to the declared type of `field`
pub fn coerce_value(field: &Field, value: Option<&JsonValue>) -> Result<Value> {
    let value = match value {
        None | Some(JsonValue::Null) => return Ok(Value::Null),
        Some(value) => value,
    };

    match field.r#type {
        FieldType::Timestamp => match value {
            JsonValue::String(s) => parse_timestamp(s).map(Value::Timestamp).ok_or_else(|| {
                Error::Validation(format!(
                    "Cannot convert value to timestamp: {s} (field {})",
                    field.name
                ))
            }),
            other => Err(type_mismatch(field, other)),
        },
        FieldType::Integer => match value {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral_f64))
                .map(Value::Int)
                .ok_or_else(|| type_mismatch(field, value)),
            JsonValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| type_mismatch(field, value)),
            other => Err(type_mismatch(field, other)),
        },
        FieldType::Float => match value {
            JsonValue::Number(n) => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| type_mismatch(field, value)),
            JsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .map(Value::Float)
                .ok_or_else(|| type_mismatch(field, value)),
            other => Err(type_mismatch(field, other)),
        },
        FieldType::String => match value {
            JsonValue::String(s) => Ok(Value::Str(s.clone())),
            JsonValue::Number(n) => Ok(Value::Str(number_text(n))),
            JsonValue::Bool(b) => Ok(Value::Str(b.to_string())),
            other => Err(type_mismatch(field, other)),
        },
    }
}

/// Render a stored value in the wire format; `Null` becomes `None`
pub fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Render a stored row as cells aligned to `fields`
pub fn format_row(fields: &[Field], row: &Row) -> Vec<Option<String>> {
    fields
        .iter()
        .map(|field| format_value(row.get(&field.name)))
        .collect()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Integers keep their digits; floats use the shortest round-trip decimal
fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(|x| x.to_string()).unwrap_or_else(|| n.to_string())
    }
}

fn integral_f64(x: f64) -> Option<i64> {
    // i64::MAX is not representable as f64, so the upper bound is exclusive
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Some(x as i64)
    } else {
        None
    }
}

fn type_mismatch(field: &Field, value: &JsonValue) -> Error {
    Error::Validation(format!(
        "Cannot convert value {value} to {} for field {}",
        field.r#type, field.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn schema() -> Vec<Field> {
        vec![
            Field::nullable("id", FieldType::Integer),
            Field::nullable("score", FieldType::Float),
            Field::nullable("name", FieldType::String),
            Field::nullable("at", FieldType::Timestamp),
        ]
    }

    #[test]
    fn test_coerce_row_by_declared_type() {
        let row = coerce_row(
            &schema(),
            &object(json!({
                "id": 1,
                "score": 2.5,
                "name": "alice",
                "at": "2023-01-01T00:00:00Z"
            })),
        )
        .unwrap();

        assert_eq!(row.get("id"), &Value::Int(1));
        assert_eq!(row.get("score"), &Value::Float(2.5));
        assert_eq!(row.get("name"), &Value::Str("alice".to_string()));
        assert_eq!(
            row.get("at"),
            &Value::Timestamp(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unknown_keys_dropped_and_missing_fields_null() {
        let row = coerce_row(&schema(), &object(json!({"id": 5, "extra": "x"}))).unwrap();

        assert_eq!(row.len(), 4);
        assert_eq!(row.get("id"), &Value::Int(5));
        assert!(row.get("name").is_null());
        assert!(row.get("at").is_null());
        assert!(row.get("extra").is_null());
    }

    #[test]
    fn test_type_comes_from_schema_not_payload() {
        let fields = schema();

        assert_eq!(
            coerce_value(&fields[0], Some(&json!("42"))).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            coerce_value(&fields[0], Some(&json!(2.0))).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            coerce_value(&fields[1], Some(&json!(3))).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            coerce_value(&fields[2], Some(&json!(7))).unwrap(),
            Value::Str("7".to_string())
        );
        assert_eq!(
            coerce_value(&fields[2], Some(&json!(true))).unwrap(),
            Value::Str("true".to_string())
        );

        for (input, text) in [
            (json!(3.0), "3"),
            (json!(1e21), "1000000000000000000000"),
            (json!(1e-7), "0.0000001"),
        ] {
            let value = coerce_value(&fields[2], Some(&input)).unwrap();
            assert_eq!(format_value(&value).as_deref(), Some(text));
        }
    }

    #[test]
    fn test_timestamp_with_offset_normalized_to_utc() {
        let field = Field::nullable("at", FieldType::Timestamp);
        let value = coerce_value(&field, Some(&json!("2023-01-01T09:00:00+09:00"))).unwrap();
        assert_eq!(format_value(&value), Some("1672531200".to_string()));
    }

    #[test]
    fn test_malformed_values_rejected() {
        let fields = schema();

        let err = coerce_value(&fields[3], Some(&json!("yesterday"))).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.reason(), "invalid");

        assert!(coerce_value(&fields[3], Some(&json!(1672531200))).is_err());
        assert!(coerce_value(&fields[0], Some(&json!(1.5))).is_err());
        assert!(coerce_value(&fields[0], Some(&json!("abc"))).is_err());
        assert!(coerce_value(&fields[1], Some(&json!("NaN"))).is_err());
        assert!(coerce_value(&fields[2], Some(&json!({"a": 1}))).is_err());
    }

    #[test]
    fn test_format_values() {
        assert_eq!(format_value(&Value::Null), None);
        assert_eq!(format_value(&Value::Float(3.0)), Some("3".to_string()));
        assert_eq!(format_value(&Value::Float(3.14)), Some("3.14".to_string()));
        assert_eq!(format_value(&Value::Int(10)), Some("10".to_string()));
        assert_eq!(
            format_value(&Value::Str("hi".to_string())),
            Some("hi".to_string())
        );
    }

    #[test]
    fn test_format_row_follows_schema_order() {
        let fields = schema();
        let row = coerce_row(
            &fields,
            &object(json!({"name": "bob", "at": "2023-01-01T00:00:00Z", "id": 3})),
        )
        .unwrap();

        assert_eq!(
            format_row(&fields, &row),
            vec![
                Some("3".to_string()),
                None,
                Some("bob".to_string()),
                Some("1672531200".to_string()),
            ]
        );
    }
}
