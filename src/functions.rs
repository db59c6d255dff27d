//! Query-function facades: `get_value`, `set_value` and `update_value`.
//!
//! Each facade is initialized once with the argument schemas, which are
//! validated up front, then evaluated per row. Constant keys are parsed once
//! through a per-instance [`PathCache`].

use crate::config::EngineConfig;
use crate::engine::{Assignments, Engine, root_record_schema};
use crate::error::{EngineError, EngineResult};
use crate::path::{Path, PathCache};
use crate::schema::{LeafKind, Schema};
use crate::value::Value;

/// Shared surface of the three facades.
pub trait RecordFunction: Sized {
    /// Name used in plan output.
    const NAME: &'static str;

    /// Validate argument schemas and build an instance with `config`.
    fn initialize_with(config: EngineConfig, args: &[Schema]) -> EngineResult<Self>;

    /// [`RecordFunction::initialize_with`] under the default config.
    fn initialize(args: &[Schema]) -> EngineResult<Self> {
        Self::initialize_with(EngineConfig::default(), args)
    }

    /// Evaluate one row. A null source record yields null.
    fn evaluate(&mut self, args: &[Value]) -> EngineResult<Value>;

    /// `name(arg, ...)`.
    fn display_string(children: &[&str]) -> String {
        format!("{}({})", Self::NAME, children.join(", "))
    }
}

// ─── Argument checks ────────────────────────────────────────────────────────

fn arity(function: &'static str, expected: &'static str, actual: usize) -> EngineError {
    EngineError::ArityMismatch {
        function,
        expected,
        actual,
    }
}

fn check_key(args: &[Schema], position: usize) -> EngineResult<()> {
    match args.get(position) {
        Some(Schema::Leaf(LeafKind::String)) => Ok(()),
        _ => Err(EngineError::NotAStringKey { position }),
    }
}

fn check_leaf(args: &[Schema], position: usize) -> EngineResult<()> {
    match args.get(position) {
        Some(Schema::Leaf(_)) => Ok(()),
        _ => Err(EngineError::NotALeafValue { position }),
    }
}

fn key_path(paths: &mut PathCache, key: &Value) -> EngineResult<Path> {
    let key = key.as_str().ok_or(EngineError::InvalidKey)?;
    paths.get_or_parse(key)
}

struct Facade {
    engine: Engine,
    paths: PathCache,
    source: Schema,
}

impl Facade {
    fn new(config: EngineConfig, source: &Schema) -> EngineResult<Self> {
        root_record_schema(source)?;
        let paths = PathCache::new(config.path_cache_capacity);
        Ok(Self {
            engine: Engine::new(config),
            paths,
            source: source.clone(),
        })
    }
}

// ─── get_value(record, key) ─────────────────────────────────────────────────

pub struct GetValue {
    inner: Facade,
}

impl RecordFunction for GetValue {
    const NAME: &'static str = "get_value";

    fn initialize_with(config: EngineConfig, args: &[Schema]) -> EngineResult<Self> {
        let [source, _] = args else {
            return Err(arity(Self::NAME, "2", args.len()));
        };
        check_key(args, 1)?;
        Ok(Self {
            inner: Facade::new(config, source)?,
        })
    }

    /// The value at the key, or null when the key resolves to nothing.
    fn evaluate(&mut self, args: &[Value]) -> EngineResult<Value> {
        let [source, key] = args else {
            return Err(arity(Self::NAME, "2", args.len()));
        };
        if source.is_null() {
            return Ok(Value::Null);
        }
        let path = key_path(&mut self.inner.paths, key)?;
        let found = self.inner.engine.read(source, &self.inner.source, &path)?;
        Ok(found.cloned().unwrap_or_default())
    }
}

// ─── set_value(record, key1, value1, ...) ───────────────────────────────────

const SET_ARITY: &str = "1 + 2k (k >= 1)";

pub struct SetValue {
    inner: Facade,
}

impl SetValue {
    /// Output rows share the source record's schema.
    pub fn output_schema(&self) -> &Schema {
        &self.inner.source
    }
}

impl RecordFunction for SetValue {
    const NAME: &'static str = "set_value";

    fn initialize_with(config: EngineConfig, args: &[Schema]) -> EngineResult<Self> {
        let Some((source, pairs)) = args.split_first() else {
            return Err(arity(Self::NAME, SET_ARITY, 0));
        };
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(arity(Self::NAME, SET_ARITY, args.len()));
        }
        for position in (1..args.len()).step_by(2) {
            check_key(args, position)?;
            check_leaf(args, position + 1)?;
        }
        Ok(Self {
            inner: Facade::new(config, source)?,
        })
    }

    /// A copy of the source with every key/value pair applied in one pass.
    fn evaluate(&mut self, args: &[Value]) -> EngineResult<Value> {
        let Some((source, pairs)) = args.split_first() else {
            return Err(arity(Self::NAME, SET_ARITY, 0));
        };
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(arity(Self::NAME, SET_ARITY, args.len()));
        }
        if source.is_null() {
            return Ok(Value::Null);
        }

        let mut assignments = Assignments::new();
        for pair in pairs.chunks_exact(2) {
            let path = key_path(&mut self.inner.paths, &pair[0])?;
            assignments.insert(path, pair[1].clone());
        }
        self.inner
            .engine
            .transform(source, &self.inner.source, &assignments)
    }
}

// ─── update_value(record, key, value) ───────────────────────────────────────

pub struct UpdateValue {
    inner: Facade,
}

impl UpdateValue {
    pub fn output_schema(&self) -> &Schema {
        &self.inner.source
    }
}

impl RecordFunction for UpdateValue {
    const NAME: &'static str = "update_value";

    fn initialize_with(config: EngineConfig, args: &[Schema]) -> EngineResult<Self> {
        let [source, _, _] = args else {
            return Err(arity(Self::NAME, "3", args.len()));
        };
        check_key(args, 1)?;
        check_leaf(args, 2)?;
        Ok(Self {
            inner: Facade::new(config, source)?,
        })
    }

    /// A copy of the source with the key replaced through its JSON form, or
    /// the source itself when the key is not present.
    fn evaluate(&mut self, args: &[Value]) -> EngineResult<Value> {
        let [source, key, value] = args else {
            return Err(arity(Self::NAME, "3", args.len()));
        };
        if source.is_null() {
            return Ok(Value::Null);
        }
        let path = key_path(&mut self.inner.paths, key)?;
        let mut assignments = Assignments::new();
        assignments.insert(path, value.clone());
        self.inner
            .engine
            .update_via_json(source, &self.inner.source, &assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaseMatch;
    use crate::record;
    use crate::type_string::parse_type;
    use crate::value::RecordKind;

    const PERSON: &str = "struct<name:string,age:int,address:struct<city:string,is_asia:boolean>>";

    fn person() -> Schema {
        parse_type(PERSON).unwrap()
    }

    fn row() -> Value {
        record!["haha", 10, record!["new york", false]]
    }

    // ── get_value ───────────────────────────────────────────────────────────

    #[test]
    fn test_get_value() {
        let mut f = GetValue::initialize(&[person(), Schema::string()]).unwrap();
        assert_eq!(f.evaluate(&[row(), Value::from("name")]).unwrap(), Value::from("haha"));
        assert_eq!(
            f.evaluate(&[row(), Value::from("address.city")]).unwrap(),
            Value::from("new york")
        );
        assert_eq!(f.evaluate(&[row(), Value::from("address.zip")]).unwrap(), Value::Null);
        assert_eq!(
            f.evaluate(&[Value::Null, Value::from("name")]).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_get_value_child_not_struct() {
        let mut f = GetValue::initialize(&[person(), Schema::string()]).unwrap();
        let err = f.evaluate(&[row(), Value::from("age.x")]).unwrap_err();
        assert!(matches!(err, EngineError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_get_value_initialize_checks() {
        assert!(matches!(
            GetValue::initialize(&[person()]),
            Err(EngineError::ArityMismatch { actual: 1, .. })
        ));
        assert!(matches!(
            GetValue::initialize(&[Schema::string(), Schema::string()]),
            Err(EngineError::RootNotRecord { .. })
        ));
        assert!(matches!(
            GetValue::initialize(&[person(), Schema::int()]),
            Err(EngineError::NotAStringKey { position: 1 })
        ));
    }

    #[test]
    fn test_invalid_key_at_evaluate() {
        let mut f = GetValue::initialize(&[person(), Schema::string()]).unwrap();
        assert!(matches!(
            f.evaluate(&[row(), Value::Null]),
            Err(EngineError::InvalidKey)
        ));
        assert!(matches!(
            f.evaluate(&[row(), Value::from("")]),
            Err(EngineError::EmptyPath)
        ));
    }

    // ── set_value ───────────────────────────────────────────────────────────

    #[test]
    fn test_set_value_batch() {
        let schema = person();
        let mut f = SetValue::initialize(&[
            schema.clone(),
            Schema::string(),
            Schema::string(),
            Schema::string(),
            Schema::boolean(),
        ])
        .unwrap();
        assert_eq!(f.output_schema(), &schema);

        let out = f
            .evaluate(&[
                row(),
                Value::from("address.city"),
                Value::from("seoul"),
                Value::from("address.is_asia"),
                Value::from(true),
            ])
            .unwrap();
        assert_eq!(out, record!["haha", 10, record!["seoul", true]]);

        // Nodes from a type string are built natively.
        let rec = out.as_record().unwrap();
        assert_eq!(rec.kind(), &RecordKind::Struct(PERSON.into()));
    }

    #[test]
    fn test_set_value_initialize_checks() {
        let s = Schema::string;
        assert!(matches!(
            SetValue::initialize(&[person(), s()]),
            Err(EngineError::ArityMismatch { actual: 2, .. })
        ));
        assert!(matches!(
            SetValue::initialize(&[person()]),
            Err(EngineError::ArityMismatch { actual: 1, .. })
        ));
        assert!(matches!(
            SetValue::initialize(&[]),
            Err(EngineError::ArityMismatch { actual: 0, .. })
        ));
        assert!(matches!(
            SetValue::initialize(&[person(), s(), s(), Schema::int(), s()]),
            Err(EngineError::NotAStringKey { position: 3 })
        ));
        assert!(matches!(
            SetValue::initialize(&[person(), s(), person()]),
            Err(EngineError::NotALeafValue { position: 2 })
        ));
    }

    #[test]
    fn test_set_value_null_source() {
        let mut f = SetValue::initialize(&[person(), Schema::string(), Schema::int()]).unwrap();
        let out = f
            .evaluate(&[Value::Null, Value::from("age"), Value::from(1)])
            .unwrap();
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn test_path_cache_reused() {
        let mut f = SetValue::initialize(&[person(), Schema::string(), Schema::int()]).unwrap();
        for age in 0..5 {
            let out = f.evaluate(&[row(), Value::from("age"), Value::from(age)]).unwrap();
            assert_eq!(out.as_record().and_then(|r| r.get_field(1)), Some(&Value::from(age)));
        }
        assert_eq!(f.inner.paths.len(), 1);
    }

    // ── update_value ────────────────────────────────────────────────────────

    #[test]
    fn test_update_value() {
        let mut f =
            UpdateValue::initialize(&[person(), Schema::string(), Schema::string()]).unwrap();
        let out = f
            .evaluate(&[row(), Value::from("address.city"), Value::from("seoul")])
            .unwrap();
        assert_eq!(out, record!["haha", 10, record!["seoul", false]]);

        let out = f
            .evaluate(&[row(), Value::from("address.zip"), Value::from("seoul")])
            .unwrap();
        assert_eq!(out, row());
    }

    #[test]
    fn test_update_value_initialize_checks() {
        assert!(matches!(
            UpdateValue::initialize(&[person(), Schema::string()]),
            Err(EngineError::ArityMismatch { actual: 2, .. })
        ));
        assert!(matches!(
            UpdateValue::initialize(&[person(), Schema::string(), person()]),
            Err(EngineError::NotALeafValue { position: 2 })
        ));
    }

    #[test]
    fn test_config_flows_through() {
        let config = EngineConfig::default().with_case_match(CaseMatch::Sensitive);
        let mut f =
            GetValue::initialize_with(config, &[person(), Schema::string()]).unwrap();
        assert_eq!(f.evaluate(&[row(), Value::from("NAME")]).unwrap(), Value::Null);
    }

    #[test]
    fn test_display_string() {
        assert_eq!(GetValue::display_string(&["r", "'a.b'"]), "get_value(r, 'a.b')");
        assert_eq!(
            SetValue::display_string(&["r", "'a'", "1"]),
            "set_value(r, 'a', 1)"
        );
        assert_eq!(UpdateValue::display_string(&[]), "update_value()");
    }
}
