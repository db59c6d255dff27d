//! Path-addressed reads and writes over nested, schema-typed records.
//!
//! A dotted key such as `address.city` is resolved against a runtime
//! [`Schema`]. Reads borrow the value found there; writes produce a new
//! record with one or more leaves replaced, leaving the input untouched.

pub mod builder;
pub mod config;
pub mod deserialization;
pub mod engine;
pub mod error;
pub mod functions;
pub mod path;
pub mod schema;
pub mod serialization;
pub mod type_string;
pub mod value;

pub use builder::{PositionalBuilder, RecordBuilder, SettableBuilder};
pub use config::{CaseMatch, EngineConfig};
pub use engine::{Assignments, Engine};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use functions::{GetValue, RecordFunction, SetValue, UpdateValue};
pub use path::{MAX_PATH_DEPTH, Path, PathCache};
pub use schema::{Category, Field, LeafKind, RecordSchema, Schema};
pub use type_string::{MAX_TYPE_DEPTH, parse_type};
pub use value::{Leaf, Record, RecordKind, StructInstance, Value};
