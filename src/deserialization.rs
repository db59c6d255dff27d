use crate::builder::RecordBuilder;
use crate::config::CaseMatch;
use crate::error::{EngineError, EngineResult};
use crate::schema::{LeafKind, Schema};
use crate::serialization::trail_label;
use crate::value::{Leaf, Value};
use serde_json::{Map, Value as JsonValue};
use smol_str::SmolStr;
use std::sync::Arc;

// ─── Reader ─────────────────────────────────────────────────────────────────

/// Parse JSON text into a value shaped by `schema`.
pub fn from_json_str(text: &str, schema: &Schema) -> EngineResult<Value> {
    let json: JsonValue = serde_json::from_str(text)?;
    from_json_value(&json, schema)
}

/// Convert a JSON document into a value shaped by `schema`.
///
/// Object keys are matched to field names exactly first, then ignoring ASCII
/// case. Missing keys read as null, as do fields hidden behind an earlier
/// field of the same name. Scalars are coerced into the declared
/// leaf kind where the conversion is lossless, strings included.
pub fn from_json_value(json: &JsonValue, schema: &Schema) -> EngineResult<Value> {
    let mut trail = Vec::new();
    read_value(json, schema, &mut trail)
}

fn read_value<'s>(
    json: &JsonValue,
    schema: &'s Schema,
    trail: &mut Vec<&'s str>,
) -> EngineResult<Value> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    match schema {
        Schema::Leaf(kind) => read_leaf(json, *kind).map(Value::Leaf).ok_or_else(|| {
            let reason = format!("cannot read {json} as {}", kind.type_name());
            decode_error(trail.as_slice(), reason)
        }),
        Schema::Record(rs) => {
            let JsonValue::Object(map) = json else {
                let reason = format!("expected object, found {json}");
                return Err(decode_error(trail.as_slice(), reason));
            };
            let mut builder = RecordBuilder::for_schema(rs);
            for field in rs.fields() {
                if !rs.resolves_to(field, CaseMatch::Sensitive) {
                    builder.set(field.ordinal(), Value::Null)?;
                    continue;
                }
                let value = match lookup(map, field.name()) {
                    Some(child) => {
                        trail.push(field.name());
                        let value = read_value(child, field.schema(), trail);
                        trail.pop();
                        value?
                    }
                    None => Value::Null,
                };
                builder.set(field.ordinal(), value)?;
            }
            Ok(builder.finish())
        }
    }
}

fn lookup<'j>(map: &'j Map<String, JsonValue>, name: &str) -> Option<&'j JsonValue> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

fn read_leaf(json: &JsonValue, kind: LeafKind) -> Option<Leaf> {
    match kind {
        LeafKind::Boolean => match json {
            JsonValue::Bool(b) => Some(Leaf::Boolean(*b)),
            JsonValue::String(s) if s.eq_ignore_ascii_case("true") => Some(Leaf::Boolean(true)),
            JsonValue::String(s) if s.eq_ignore_ascii_case("false") => Some(Leaf::Boolean(false)),
            _ => None,
        },
        LeafKind::Int => read_i64(json)
            .and_then(|i| i32::try_from(i).ok())
            .map(Leaf::Int),
        LeafKind::BigInt => read_i64(json).map(Leaf::BigInt),
        LeafKind::Float => read_f64(json).map(|f| Leaf::Float(f as f32)),
        LeafKind::Double => read_f64(json).map(Leaf::Double),
        LeafKind::String => match json {
            JsonValue::String(s) => Some(Leaf::String(SmolStr::from(s.as_str()))),
            JsonValue::Bool(_) | JsonValue::Number(_) => {
                Some(Leaf::String(SmolStr::from(json.to_string())))
            }
            _ => None,
        },
        LeafKind::Binary => match json {
            JsonValue::String(s) => Some(Leaf::Binary(Arc::from(s.as_bytes()))),
            _ => None,
        },
    }
}

fn read_i64(json: &JsonValue) -> Option<i64> {
    match json {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn read_f64(json: &JsonValue) -> Option<f64> {
    match json {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decode_error(trail: &[&str], reason: String) -> EngineError {
    EngineError::JsonDecode {
        path: SmolStr::from(trail_label(trail)),
        reason: SmolStr::from(reason),
    }
}
