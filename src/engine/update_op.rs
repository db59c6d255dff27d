use super::{Assignments, Engine, root_record_schema};
use crate::builder::RecordBuilder;
use crate::config::CaseMatch;
use crate::deserialization::from_json_value;
use crate::error::EngineResult;
use crate::path::Path;
use crate::schema::{RecordSchema, Schema};
use crate::serialization::{leaf_to_json, to_json_string};
use crate::value::Value;
use serde_json::{Map, Value as JsonValue};
use tracing::warn;

impl Engine {
    /// Apply assignments by editing the record's JSON form.
    ///
    /// The record is written out as JSON text, each assignment replaces one
    /// existing key of the parsed document, and the document is read back
    /// against `schema`. If any assignment names a key that is not in the
    /// document, the original record is returned as-is. Fields hidden behind
    /// an earlier field of the same name keep their original values.
    pub fn update_via_json(
        &self,
        record: &Value,
        schema: &Schema,
        assignments: &Assignments,
    ) -> EngineResult<Value> {
        let root = root_record_schema(schema)?;
        if record.is_null() {
            return Ok(Value::Null);
        }

        let text = to_json_string(record, schema)?;
        let mut doc: JsonValue = serde_json::from_str(&text)?;

        for (path, new_value) in assignments.iter() {
            let Some(slot) = locate_mut(&mut doc, path, self.config.case_match) else {
                warn!(path = %path, "update target not found, returning original record");
                return Ok(record.clone());
            };
            *slot = leaf_to_json(new_value, path)?;
        }

        let decoded = from_json_value(&doc, schema)?;
        if !root.has_shadowed() {
            return Ok(decoded);
        }
        restore_shadowed(&decoded, record, root)
    }
}

/// Put back the fields the JSON form could not carry. A field hidden behind
/// an earlier one of the same name keeps its value from `original`.
fn restore_shadowed(
    decoded: &Value,
    original: &Value,
    schema: &RecordSchema,
) -> EngineResult<Value> {
    let (Value::Record(dec), Value::Record(orig)) = (decoded, original) else {
        return Ok(decoded.clone());
    };
    let mut builder = RecordBuilder::for_schema(schema);
    for ((field, d), o) in schema.fields().iter().zip(dec.fields()).zip(orig.fields()) {
        let value = if !schema.resolves_to(field, CaseMatch::Sensitive) {
            o.clone()
        } else {
            match field.schema() {
                Schema::Record(child) if child.has_shadowed() => restore_shadowed(d, o, child)?,
                _ => d.clone(),
            }
        };
        builder.set(field.ordinal(), value)?;
    }
    Ok(builder.finish())
}

/// The existing slot at `path`, descending through object keys only.
fn locate_mut<'d>(
    doc: &'d mut JsonValue,
    path: &Path,
    case: CaseMatch,
) -> Option<&'d mut JsonValue> {
    let mut current = doc;
    for segment in path.segments() {
        let JsonValue::Object(map) = current else {
            return None;
        };
        current = find_key_mut(map, segment, case)?;
    }
    Some(current)
}

fn find_key_mut<'m>(
    map: &'m mut Map<String, JsonValue>,
    key: &str,
    case: CaseMatch,
) -> Option<&'m mut JsonValue> {
    match case {
        CaseMatch::Sensitive => map.get_mut(key),
        CaseMatch::Insensitive => map
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v),
    }
}
