use crate::error::{EngineError, EngineResult};
use crate::schema::LeafKind;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use smol_str::SmolStr;
use std::sync::Arc;

// ─── Leaf ───────────────────────────────────────────────────────────────────

/// A boxed primitive held by a leaf field.
#[derive(Clone, PartialEq)]
pub enum Leaf {
    Boolean(bool),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    String(SmolStr),
    Binary(Arc<[u8]>),
}

impl std::fmt::Debug for Leaf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leaf::Boolean(b) => write!(f, "Boolean({})", b),
            Leaf::Int(i) => write!(f, "Int({})", i),
            Leaf::BigInt(i) => write!(f, "BigInt({})", i),
            Leaf::Float(v) => write!(f, "Float({})", v),
            Leaf::Double(v) => write!(f, "Double({})", v),
            Leaf::String(s) => write!(f, "String({:?})", s.as_str()),
            Leaf::Binary(b) => write!(f, "Binary({} bytes)", b.len()),
        }
    }
}

impl Leaf {
    pub fn kind(&self) -> LeafKind {
        match self {
            Leaf::Boolean(_) => LeafKind::Boolean,
            Leaf::Int(_) => LeafKind::Int,
            Leaf::BigInt(_) => LeafKind::BigInt,
            Leaf::Float(_) => LeafKind::Float,
            Leaf::Double(_) => LeafKind::Double,
            Leaf::String(_) => LeafKind::String,
            Leaf::Binary(_) => LeafKind::Binary,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Leaf::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

// ─── Record ─────────────────────────────────────────────────────────────────

/// How a record was materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// Host-native instance of the named struct type.
    Struct(SmolStr),
    /// Plain ordered list of field values.
    Positional,
}

/// An immutable record: field values aligned by ordinal with its schema.
///
/// Field storage sits behind an `Arc`, so cloning a record shares it. Nothing
/// hands out mutable access to a built record; writers produce new records
/// through [`crate::builder::RecordBuilder`].
#[derive(Debug, Clone)]
pub struct Record {
    kind: RecordKind,
    fields: Arc<[Value]>,
}

impl Record {
    pub fn positional(fields: Vec<Value>) -> Self {
        Self {
            kind: RecordKind::Positional,
            fields: fields.into(),
        }
    }

    pub(crate) fn from_parts(kind: RecordKind, fields: Vec<Value>) -> Self {
        Self {
            kind,
            fields: fields.into(),
        }
    }

    #[inline]
    pub fn kind(&self) -> &RecordKind {
        &self.kind
    }

    #[inline]
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, RecordKind::Struct(_))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field value by ordinal.
    #[inline]
    pub fn get_field(&self, ordinal: usize) -> Option<&Value> {
        self.fields.get(ordinal)
    }

    #[inline]
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// True when both records share the same field storage.
    #[inline]
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }
}

/// Representation is not part of equality: a struct and a positional record
/// holding the same values compare equal.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

/// A mutable instance of a settable record type.
///
/// Handed out by [`crate::schema::RecordSchema::create_instance`] for schema
/// nodes that carry a struct type name.
#[derive(Debug)]
pub struct StructInstance {
    type_name: SmolStr,
    slots: Vec<Value>,
}

impl StructInstance {
    pub(crate) fn new(type_name: SmolStr, len: usize) -> Self {
        Self {
            type_name,
            slots: vec![Value::Null; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get_field(&self, ordinal: usize) -> Option<&Value> {
        self.slots.get(ordinal)
    }

    pub fn set_field(&mut self, ordinal: usize, value: Value) -> EngineResult<()> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(ordinal)
            .ok_or(EngineError::OrdinalOutOfRange { ordinal, len })?;
        *slot = value;
        Ok(())
    }

    pub fn into_record(self) -> Record {
        Record::from_parts(RecordKind::Struct(self.type_name), self.slots)
    }
}

// ─── Value ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Leaf(Leaf),
    Record(Record),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Value::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_leaf()?.as_str()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Leaf(Leaf::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Leaf(Leaf::Int(i)) => Some(*i as i64),
            Value::Leaf(Leaf::BigInt(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Leaf(Leaf::Float(f)) => Some(*f as f64),
            Value::Leaf(Leaf::Double(f)) => Some(*f),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Leaf(l) => l.kind().type_name(),
            Value::Record(_) => "record",
        }
    }
}

// ─── Serialize (diagnostics; records render as arrays) ──────────────────────

impl Serialize for Leaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Leaf::Boolean(b) => serializer.serialize_bool(*b),
            Leaf::Int(i) => serializer.serialize_i32(*i),
            Leaf::BigInt(i) => serializer.serialize_i64(*i),
            Leaf::Float(f) => serializer.serialize_f32(*f),
            Leaf::Double(f) => serializer.serialize_f64(*f),
            Leaf::String(s) => serializer.serialize_str(s.as_str()),
            Leaf::Binary(b) => serializer.serialize_bytes(b),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Leaf(l) => l.serialize(serializer),
            Value::Record(r) => {
                let mut seq = serializer.serialize_seq(Some(r.len()))?;
                for v in r.fields() {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
        }
    }
}

// ─── From impls ─────────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Leaf(Leaf::Boolean(b))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Leaf(Leaf::Int(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Leaf(Leaf::BigInt(i))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Leaf(Leaf::Float(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Leaf(Leaf::Double(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Leaf(Leaf::String(SmolStr::from(s)))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Leaf(Leaf::String(SmolStr::from(s)))
    }
}

impl From<SmolStr> for Value {
    fn from(s: SmolStr) -> Self {
        Value::Leaf(Leaf::String(s))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Leaf(Leaf::Binary(Arc::from(b)))
    }
}

impl From<Leaf> for Value {
    fn from(l: Leaf) -> Self {
        Value::Leaf(l)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(fields: Vec<Value>) -> Self {
        Value::Record(Record::positional(fields))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Builds a positional record value from expressions convertible into
/// [`Value`]. Nest invocations for sub-records.
#[macro_export]
macro_rules! record {
    () => {
        $crate::Value::Record($crate::Record::positional(Vec::new()))
    };
    ($($val:expr),+ $(,)?) => {
        $crate::Value::Record($crate::Record::positional(vec![$($crate::Value::from($val)),+]))
    };
}
