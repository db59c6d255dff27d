//! Record construction strategies.
//!
//! Every output record level is materialized through a [`RecordBuilder`].
//! Schema nodes that can create native instances get a [`SettableBuilder`],
//! all others a [`PositionalBuilder`]. The choice is made per node.

use crate::error::{EngineError, EngineResult};
use crate::schema::RecordSchema;
use crate::value::{Record, StructInstance, Value};
use tracing::trace;

/// Fills a native instance obtained from the schema node.
#[derive(Debug)]
pub struct SettableBuilder {
    instance: StructInstance,
    written: Vec<bool>,
}

impl SettableBuilder {
    pub fn new(instance: StructInstance) -> Self {
        let written = vec![false; instance.len()];
        Self { instance, written }
    }

    pub fn set(&mut self, ordinal: usize, value: Value) -> EngineResult<()> {
        mark_written(&mut self.written, ordinal)?;
        self.instance.set_field(ordinal, value)
    }

    pub fn finish(self) -> Value {
        Value::Record(self.instance.into_record())
    }
}

/// Collects field values into a plain ordinal-aligned list.
#[derive(Debug)]
pub struct PositionalBuilder {
    slots: Vec<Option<Value>>,
}

impl PositionalBuilder {
    pub fn new(field_count: usize) -> Self {
        Self {
            slots: vec![None; field_count],
        }
    }

    pub fn set(&mut self, ordinal: usize, value: Value) -> EngineResult<()> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(ordinal)
            .ok_or(EngineError::OrdinalOutOfRange { ordinal, len })?;
        if slot.is_some() {
            return Err(EngineError::OrdinalAlreadySet { ordinal });
        }
        *slot = Some(value);
        Ok(())
    }

    pub fn finish(self) -> Value {
        let fields = self
            .slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Value::Null))
            .collect();
        Value::Record(Record::positional(fields))
    }
}

#[inline]
fn mark_written(written: &mut [bool], ordinal: usize) -> EngineResult<()> {
    let len = written.len();
    let flag = written
        .get_mut(ordinal)
        .ok_or(EngineError::OrdinalOutOfRange { ordinal, len })?;
    if *flag {
        return Err(EngineError::OrdinalAlreadySet { ordinal });
    }
    *flag = true;
    Ok(())
}

#[derive(Debug)]
pub enum RecordBuilder {
    Settable(SettableBuilder),
    Positional(PositionalBuilder),
}

impl RecordBuilder {
    /// Pick the strategy this schema node supports.
    pub fn for_schema(schema: &RecordSchema) -> Self {
        match schema.create_instance() {
            Some(instance) => {
                trace!(struct_name = instance.type_name(), "settable builder");
                RecordBuilder::Settable(SettableBuilder::new(instance))
            }
            None => RecordBuilder::Positional(PositionalBuilder::new(schema.len())),
        }
    }

    /// Set one field. Each ordinal may be set once, in any order.
    #[inline]
    pub fn set(&mut self, ordinal: usize, value: Value) -> EngineResult<()> {
        match self {
            RecordBuilder::Settable(b) => b.set(ordinal, value),
            RecordBuilder::Positional(b) => b.set(ordinal, value),
        }
    }

    /// Produce the record. Ordinals never set come out as null.
    pub fn finish(self) -> Value {
        match self {
            RecordBuilder::Settable(b) => b.finish(),
            RecordBuilder::Positional(b) => b.finish(),
        }
    }

    pub fn is_settable(&self) -> bool {
        matches!(self, RecordBuilder::Settable(_))
    }
}
