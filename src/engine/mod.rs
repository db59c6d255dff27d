//! Path-directed reads and writes over schema-described records.

mod assignments;
mod read_op;
mod update_op;
mod write_op;

pub use assignments::Assignments;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::path::Path;
use crate::schema::{RecordSchema, Schema};
use crate::value::Record;
use smol_str::SmolStr;

/// Stateless entry point. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

pub(crate) fn root_record_schema(schema: &Schema) -> EngineResult<&RecordSchema> {
    schema.as_record().ok_or_else(|| EngineError::RootNotRecord {
        found: schema.type_name(),
    })
}

pub(crate) fn path_label(path: &Path) -> SmolStr {
    if path.is_empty() {
        SmolStr::new_static("<root>")
    } else {
        SmolStr::from(path.to_string())
    }
}

/// A record value must carry exactly one value per schema field.
pub(crate) fn check_arity(
    record: &Record,
    schema: &RecordSchema,
    label: impl FnOnce() -> SmolStr,
) -> EngineResult<()> {
    if record.len() != schema.len() {
        return Err(EngineError::shape(
            label(),
            format!("record has {} fields, schema declares {}", record.len(), schema.len()),
        ));
    }
    Ok(())
}
