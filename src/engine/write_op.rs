use super::assignments::AssignmentIndex;
use super::{Assignments, Engine, check_arity, path_label, root_record_schema};
use crate::builder::RecordBuilder;
use crate::config::CaseMatch;
use crate::error::{EngineError, EngineResult};
use crate::path::Path;
use crate::schema::{Field, RecordSchema, Schema};
use crate::value::{Record, Value};
use tracing::debug;

impl Engine {
    /// Copy `record` with every assignment applied.
    ///
    /// The input is never modified. The root record is always rebuilt, as is
    /// every record on the way to an assigned field. Records no assignment
    /// reaches are shared with the input when `share_untouched` is set and
    /// rebuilt otherwise.
    ///
    /// Assigned fields must be leaves, unless the new value is null. A path
    /// that continues past a leaf field fails with `SchemaMismatch`. An
    /// assignment below a null record, or along a path naming no field, is
    /// dropped.
    pub fn transform(
        &self,
        record: &Value,
        schema: &Schema,
        assignments: &Assignments,
    ) -> EngineResult<Value> {
        let root = root_record_schema(schema)?;
        let index = AssignmentIndex::build(assignments, self.config.case_match)?;
        let rec = match record {
            Value::Null => return Ok(Value::Null),
            Value::Record(r) => r,
            Value::Leaf(l) => {
                return Err(EngineError::shape(
                    "<root>",
                    format!("expected record, found {}", l.kind().type_name()),
                ));
            }
        };

        let mut walk = TransformWalk {
            case: self.config.case_match,
            share_untouched: self.config.share_untouched,
            index: &index,
            path: Path::root(),
            applied: 0,
        };
        let out = walk.rebuild(rec, root)?;
        if walk.applied < index.len() {
            debug!(
                applied = walk.applied,
                requested = index.len(),
                "assignment targets not found"
            );
        }
        Ok(out)
    }
}

struct TransformWalk<'a> {
    case: CaseMatch,
    share_untouched: bool,
    index: &'a AssignmentIndex<'a>,
    /// Folded path of the record currently being rebuilt.
    path: Path,
    applied: usize,
}

impl TransformWalk<'_> {
    fn rebuild(&mut self, record: &Record, schema: &RecordSchema) -> EngineResult<Value> {
        check_arity(record, schema, || path_label(&self.path))?;
        let mut builder = RecordBuilder::for_schema(schema);
        for (field, current) in schema.fields().iter().zip(record.fields()) {
            let value = if schema.resolves_to(field, self.case) {
                self.path.push(self.case.fold(field.name()))?;
                let result = self.field_value(field, current);
                self.path.pop();
                result?
            } else {
                self.untouched(field.schema(), current)?
            };
            builder.set(field.ordinal(), value)?;
        }
        Ok(builder.finish())
    }

    /// `self.path` already ends with `field`.
    fn field_value(&mut self, field: &Field, current: &Value) -> EngineResult<Value> {
        if let Some(new_value) = self.index.target(&self.path) {
            match (field.schema(), new_value) {
                (Schema::Record(_), Value::Leaf(_) | Value::Record(_)) => {
                    return Err(EngineError::type_mismatch(
                        path_label(&self.path),
                        "leaf field",
                        field.schema().type_name(),
                    ));
                }
                (Schema::Leaf(_), Value::Record(_)) => {
                    return Err(EngineError::type_mismatch(
                        path_label(&self.path),
                        field.schema().type_name(),
                        "record",
                    ));
                }
                _ => {}
            }
            self.applied += 1;
            return Ok(new_value.clone());
        }

        match (field.schema(), current) {
            (Schema::Leaf(_), _) if self.index.reaches_into(&self.path) => {
                Err(EngineError::SchemaMismatch {
                    path: path_label(&self.path),
                    found: field.schema().type_name(),
                })
            }
            (Schema::Leaf(_), _) => Ok(current.clone()),
            (Schema::Record(_), Value::Null) => Ok(Value::Null),
            (Schema::Record(child), Value::Record(rec)) if self.index.reaches_into(&self.path) => {
                self.rebuild(rec, child)
            }
            (Schema::Record(_), Value::Record(_)) => self.untouched(field.schema(), current),
            (Schema::Record(_), Value::Leaf(l)) => Err(EngineError::shape(
                path_label(&self.path),
                format!("expected record, found {}", l.kind().type_name()),
            )),
        }
    }

    fn untouched(&self, schema: &Schema, current: &Value) -> EngineResult<Value> {
        if self.share_untouched {
            return Ok(current.clone());
        }
        deep_copy(schema, current)
    }
}

/// Rebuild every record level of `value` through the builder strategy.
fn deep_copy(schema: &Schema, value: &Value) -> EngineResult<Value> {
    let (Schema::Record(rs), Value::Record(rec)) = (schema, value) else {
        return Ok(value.clone());
    };
    check_arity(rec, rs, || rs.struct_name().unwrap_or("record").into())?;
    let mut builder = RecordBuilder::for_schema(rs);
    for (field, current) in rs.fields().iter().zip(rec.fields()) {
        builder.set(field.ordinal(), deep_copy(field.schema(), current)?)?;
    }
    Ok(builder.finish())
}
