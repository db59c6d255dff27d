use crate::config::CaseMatch;
use crate::error::{EngineError, EngineResult};
use crate::path::Path;
use crate::schema::Schema;
use crate::value::{Leaf, Value};
use serde_json::{Map, Number, Value as JsonValue};

// ─── Writer ─────────────────────────────────────────────────────────────────

/// Render a record as a JSON object keyed by field name.
///
/// A field shadowed by an earlier field of the same name is left out, since
/// an object cannot hold both.
pub fn to_json(value: &Value, schema: &Schema) -> EngineResult<JsonValue> {
    let mut trail = Vec::new();
    write_value(value, schema, &mut trail)
}

/// [`to_json`] as compact text.
pub fn to_json_string(value: &Value, schema: &Schema) -> EngineResult<String> {
    Ok(serde_json::to_string(&to_json(value, schema)?)?)
}

/// JSON form of a single assigned value. Only null and the scalar leaf types
/// JSON can carry are accepted.
pub fn leaf_to_json(value: &Value, path: &Path) -> EngineResult<JsonValue> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Leaf(leaf) => write_leaf(leaf, || path.to_string()),
        Value::Record(_) => Err(EngineError::type_mismatch(
            path.to_string(),
            "scalar",
            "record",
        )),
    }
}

fn write_value<'s>(
    value: &Value,
    schema: &'s Schema,
    trail: &mut Vec<&'s str>,
) -> EngineResult<JsonValue> {
    match (schema, value) {
        (_, Value::Null) => Ok(JsonValue::Null),
        (Schema::Leaf(_), Value::Leaf(leaf)) => write_leaf(leaf, || trail.join(".")),
        (Schema::Record(rs), Value::Record(rec)) => {
            if rec.len() != rs.len() {
                return Err(EngineError::shape(
                    trail_label(trail),
                    format!("record has {} fields, schema declares {}", rec.len(), rs.len()),
                ));
            }
            let mut map = Map::with_capacity(rs.len());
            for (field, current) in rs.fields().iter().zip(rec.fields()) {
                if !rs.resolves_to(field, CaseMatch::Sensitive) {
                    continue;
                }
                trail.push(field.name());
                let json = write_value(current, field.schema(), trail);
                trail.pop();
                map.insert(field.name().to_owned(), json?);
            }
            Ok(JsonValue::Object(map))
        }
        (Schema::Record(_), Value::Leaf(leaf)) => Err(EngineError::shape(
            trail_label(trail),
            format!("expected record, found {}", leaf.kind().type_name()),
        )),
        (Schema::Leaf(kind), Value::Record(_)) => Err(EngineError::type_mismatch(
            trail_label(trail),
            kind.type_name(),
            "record",
        )),
    }
}

fn write_leaf(leaf: &Leaf, label: impl FnOnce() -> String) -> EngineResult<JsonValue> {
    Ok(match leaf {
        Leaf::Boolean(b) => JsonValue::Bool(*b),
        Leaf::Int(i) => JsonValue::Number(Number::from(*i)),
        Leaf::BigInt(i) => JsonValue::Number(Number::from(*i)),
        Leaf::Float(f) => finite(*f as f64, label)?,
        Leaf::Double(f) => finite(*f, label)?,
        Leaf::String(s) => JsonValue::String(s.to_string()),
        Leaf::Binary(_) => {
            return Err(EngineError::type_mismatch(label(), "json scalar", "binary"));
        }
    })
}

fn finite(f: f64, label: impl FnOnce() -> String) -> EngineResult<JsonValue> {
    Number::from_f64(f)
        .map(JsonValue::Number)
        .ok_or_else(|| EngineError::type_mismatch(label(), "finite number", f.to_string()))
}

pub(crate) fn trail_label(trail: &[&str]) -> String {
    if trail.is_empty() {
        "<root>".to_owned()
    } else {
        trail.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::schema::RecordSchema;

    fn person() -> Schema {
        Schema::record([
            ("name", Schema::string()),
            ("age", Schema::int()),
            (
                "address",
                Schema::record([("city", Schema::string()), ("is_asia", Schema::boolean())]),
            ),
        ])
    }

    #[test]
    fn test_nested_object() {
        let v = record!["haha", 10, record!["new york", false]];
        let json = to_json(&v, &person()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "haha",
                "age": 10,
                "address": {"city": "new york", "is_asia": false}
            })
        );
    }

    #[test]
    fn test_null_sub_record() {
        let v = record!["haha", 10, Value::Null];
        let text = to_json_string(&v, &person()).unwrap();
        assert_eq!(text, r#"{"name":"haha","age":10,"address":null}"#);
    }

    #[test]
    fn test_binary_is_unknown() {
        let schema = Schema::record([("blob", Schema::binary())]);
        let v = record![&b"\x00\x01"[..]];
        let err = to_json(&v, &schema).unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch { ref path, .. } if path == "blob"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let schema = Schema::record([("x", Schema::double())]);
        assert!(to_json(&record![f64::NAN], &schema).is_err());
    }

    #[test]
    fn test_shadowed_field_skipped() {
        let schema = Schema::Record(RecordSchema::new([
            ("a", Schema::int()),
            ("a", Schema::int()),
        ]));
        let json = to_json(&record![1, 2], &schema).unwrap();
        assert_eq!(json, serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_leaf_to_json() {
        let p = Path::parse("x").unwrap();
        assert_eq!(leaf_to_json(&Value::from(20), &p).unwrap(), serde_json::json!(20));
        assert_eq!(leaf_to_json(&Value::Null, &p).unwrap(), JsonValue::Null);
        assert!(leaf_to_json(&record![1], &p).is_err());
    }
}
