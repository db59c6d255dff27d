use super::{Engine, check_arity, path_label, root_record_schema};
use crate::error::{EngineError, EngineResult};
use crate::path::Path;
use crate::schema::Schema;
use crate::value::Value;

impl Engine {
    /// Resolve `path` inside `record` and borrow the value found there.
    ///
    /// Returns `Ok(None)` when a segment names no field, or when a record on
    /// the way is null. `Ok(Some(Value::Null))` means the field exists and
    /// holds null. Nothing is copied.
    ///
    /// Fails with `SchemaMismatch` when a non-final segment lands on a leaf
    /// field.
    pub fn read<'v>(
        &self,
        record: &'v Value,
        schema: &Schema,
        path: &Path,
    ) -> EngineResult<Option<&'v Value>> {
        let mut current_schema = root_record_schema(schema)?;
        if path.is_empty() {
            return Err(EngineError::EmptyPath);
        }
        let mut current = match record {
            Value::Null => return Ok(None),
            Value::Record(r) => r,
            Value::Leaf(l) => {
                return Err(EngineError::shape(
                    "<root>",
                    format!("expected record, found {}", l.kind().type_name()),
                ));
            }
        };

        let case = self.config.case_match;
        let last = path.len() - 1;
        for (depth, segment) in path.segments().iter().enumerate() {
            let Some(field) = current_schema.find_field(segment, case) else {
                return Ok(None);
            };
            check_arity(current, current_schema, || path_label(&path.truncated(depth)))?;
            let value = current
                .get_field(field.ordinal())
                .ok_or_else(|| EngineError::shape(path_label(path), "missing field value"))?;

            if depth == last {
                return Ok(Some(value));
            }

            let Schema::Record(child) = field.schema() else {
                return Err(EngineError::SchemaMismatch {
                    path: path_label(&path.truncated(depth + 1)),
                    found: field.schema().type_name(),
                });
            };
            current = match value {
                Value::Record(r) => r,
                Value::Null => return Ok(None),
                Value::Leaf(l) => {
                    return Err(EngineError::shape(
                        path_label(&path.truncated(depth + 1)),
                        format!("expected record, found {}", l.kind().type_name()),
                    ));
                }
            };
            current_schema = child;
        }
        Ok(None)
    }
}
