use crate::config::CaseMatch;
use crate::value::StructInstance;
use smol_str::SmolStr;
use std::fmt;
use xxhash_rust::xxh64::xxh64;

// ─── Leaf kinds ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    Boolean,
    Int,
    BigInt,
    Float,
    Double,
    String,
    Binary,
}

impl LeafKind {
    pub fn type_name(self) -> &'static str {
        match self {
            LeafKind::Boolean => "boolean",
            LeafKind::Int => "int",
            LeafKind::BigInt => "bigint",
            LeafKind::Float => "float",
            LeafKind::Double => "double",
            LeafKind::String => "string",
            LeafKind::Binary => "binary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Record,
    Leaf,
}

// ─── Schema ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Leaf(LeafKind),
    Record(RecordSchema),
}

impl Schema {
    pub fn record<N: Into<SmolStr>>(fields: impl IntoIterator<Item = (N, Schema)>) -> Self {
        Schema::Record(RecordSchema::new(fields))
    }

    pub fn boolean() -> Self {
        Schema::Leaf(LeafKind::Boolean)
    }

    pub fn int() -> Self {
        Schema::Leaf(LeafKind::Int)
    }

    pub fn bigint() -> Self {
        Schema::Leaf(LeafKind::BigInt)
    }

    pub fn float() -> Self {
        Schema::Leaf(LeafKind::Float)
    }

    pub fn double() -> Self {
        Schema::Leaf(LeafKind::Double)
    }

    pub fn string() -> Self {
        Schema::Leaf(LeafKind::String)
    }

    pub fn binary() -> Self {
        Schema::Leaf(LeafKind::Binary)
    }

    #[inline]
    pub fn category(&self) -> Category {
        match self {
            Schema::Leaf(_) => Category::Leaf,
            Schema::Record(_) => Category::Record,
        }
    }

    #[inline]
    pub fn as_record(&self) -> Option<&RecordSchema> {
        match self {
            Schema::Record(r) => Some(r),
            Schema::Leaf(_) => None,
        }
    }

    #[inline]
    pub fn is_record(&self) -> bool {
        matches!(self, Schema::Record(_))
    }

    /// Canonical type string, e.g. `struct<name:string,age:int>`.
    pub fn type_name(&self) -> SmolStr {
        SmolStr::from(self.to_string())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Leaf(kind) => f.write_str(kind.type_name()),
            Schema::Record(r) => fmt::Display::fmt(r, f),
        }
    }
}

// ─── Field ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: SmolStr,
    ordinal: usize,
    schema: Schema,
}

impl Field {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

// ─── Name index ─────────────────────────────────────────────────────────────

/// One entry of the name index: hash of the case-folded field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    name_hash: u64,
    ordinal: usize,
}

/// Records this small are scanned directly; the index is only consulted above.
const LINEAR_SCAN_MAX: usize = 4;

#[inline]
fn folded_hash(name: &str) -> u64 {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        xxh64(name.to_ascii_lowercase().as_bytes(), 0)
    } else {
        xxh64(name.as_bytes(), 0)
    }
}

// ─── RecordSchema ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    fields: Vec<Field>,
    /// Present when the host can create native instances of this node.
    struct_name: Option<SmolStr>,
    /// Sorted by `(name_hash, ordinal)`.
    index: Vec<IndexEntry>,
    /// Some field at or below this node repeats an earlier, identical name.
    shadowed: bool,
}

impl RecordSchema {
    /// A record node without a native constructor (built positionally).
    pub fn new<N: Into<SmolStr>>(fields: impl IntoIterator<Item = (N, Schema)>) -> Self {
        let fields: Vec<Field> = fields
            .into_iter()
            .enumerate()
            .map(|(ordinal, (name, schema))| Field {
                name: name.into(),
                ordinal,
                schema,
            })
            .collect();

        let mut index: Vec<IndexEntry> = fields
            .iter()
            .map(|f| IndexEntry {
                name_hash: folded_hash(&f.name),
                ordinal: f.ordinal,
            })
            .collect();
        index.sort_unstable_by_key(|e| (e.name_hash, e.ordinal));

        let mut schema = Self {
            fields,
            struct_name: None,
            index,
            shadowed: false,
        };
        schema.shadowed = schema.fields.iter().any(|f| {
            !schema.resolves_to(f, CaseMatch::Sensitive)
                || f.schema.as_record().is_some_and(RecordSchema::has_shadowed)
        });
        schema
    }

    /// A record node whose instances are created natively under `struct_name`.
    pub fn named<N: Into<SmolStr>>(
        struct_name: impl Into<SmolStr>,
        fields: impl IntoIterator<Item = (N, Schema)>,
    ) -> Self {
        Self::new(fields).with_struct_name(struct_name)
    }

    pub fn with_struct_name(mut self, struct_name: impl Into<SmolStr>) -> Self {
        self.struct_name = Some(struct_name.into());
        self
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[inline]
    pub fn field(&self, ordinal: usize) -> Option<&Field> {
        self.fields.get(ordinal)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn struct_name(&self) -> Option<&str> {
        self.struct_name.as_deref()
    }

    /// Whether records of this schema can be built through the settable path.
    #[inline]
    pub fn is_settable(&self) -> bool {
        self.struct_name.is_some()
    }

    /// Fresh mutable instance of this node, if the node supports one.
    pub fn create_instance(&self) -> Option<StructInstance> {
        let name = self.struct_name.as_ref()?;
        Some(StructInstance::new(name.clone(), self.fields.len()))
    }

    /// First field (lowest ordinal) whose name matches under `case`.
    pub fn find_field(&self, name: &str, case: CaseMatch) -> Option<&Field> {
        let n = self.fields.len();
        if n == 0 {
            return None;
        }
        if n <= LINEAR_SCAN_MAX {
            return self.fields.iter().find(|f| case.matches(&f.name, name));
        }

        let hash = folded_hash(name);
        let start = self.index.partition_point(|e| e.name_hash < hash);
        self.index[start..]
            .iter()
            .take_while(|e| e.name_hash == hash)
            .map(|e| &self.fields[e.ordinal])
            .find(|f| case.matches(&f.name, name))
    }

    /// Whether this node or any record below it has a field hidden behind an
    /// earlier field of exactly the same name.
    #[inline]
    pub fn has_shadowed(&self) -> bool {
        self.shadowed
    }

    /// Whether `field` is the one a path segment naming it resolves to.
    /// Later fields sharing a name are shadowed.
    #[inline]
    pub fn resolves_to(&self, field: &Field, case: CaseMatch) -> bool {
        self.find_field(&field.name, case)
            .is_some_and(|first| first.ordinal == field.ordinal)
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("struct<")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", field.name, field.schema)?;
        }
        f.write_str(">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide_schema() -> RecordSchema {
        RecordSchema::new([
            ("id", Schema::string()),
            ("Name", Schema::string()),
            ("age", Schema::int()),
            ("score", Schema::double()),
            ("active", Schema::boolean()),
            ("name", Schema::bigint()),
            ("version", Schema::bigint()),
        ])
    }

    #[test]
    fn test_linear_lookup() {
        let r = RecordSchema::new([("a", Schema::string()), ("b", Schema::int())]);
        assert_eq!(r.find_field("b", CaseMatch::Sensitive).map(Field::ordinal), Some(1));
        assert_eq!(r.find_field("B", CaseMatch::Insensitive).map(Field::ordinal), Some(1));
        assert!(r.find_field("B", CaseMatch::Sensitive).is_none());
        assert!(r.find_field("c", CaseMatch::Insensitive).is_none());
    }

    #[test]
    fn test_indexed_lookup_first_match_wins() {
        let r = wide_schema();
        assert_eq!(r.find_field("name", CaseMatch::Insensitive).map(Field::ordinal), Some(1));
        assert_eq!(r.find_field("name", CaseMatch::Sensitive).map(Field::ordinal), Some(5));
        assert_eq!(r.find_field("VERSION", CaseMatch::Insensitive).map(Field::ordinal), Some(6));
        assert!(r.find_field("missing", CaseMatch::Insensitive).is_none());
    }

    #[test]
    fn test_shadowed_duplicates() {
        let r = wide_schema();
        let second = r.field(5).unwrap();
        assert!(!r.resolves_to(second, CaseMatch::Insensitive));
        assert!(r.resolves_to(second, CaseMatch::Sensitive));
        assert!(r.resolves_to(r.field(0).unwrap(), CaseMatch::Insensitive));
    }

    #[test]
    fn test_has_shadowed_propagates() {
        let flat = RecordSchema::new([("a", Schema::int()), ("A", Schema::int())]);
        assert!(!flat.has_shadowed());

        let dup = Schema::record([("a", Schema::int()), ("a", Schema::int())]);
        assert!(dup.as_record().is_some_and(RecordSchema::has_shadowed));

        let outer = RecordSchema::new([("x", Schema::string()), ("inner", dup)]);
        assert!(outer.has_shadowed());
    }

    #[test]
    fn test_empty_record() {
        let r = RecordSchema::new(Vec::<(&str, Schema)>::new());
        assert!(r.is_empty());
        assert!(r.find_field("anything", CaseMatch::Insensitive).is_none());
    }

    #[test]
    fn test_capability_probe() {
        let plain = RecordSchema::new([("a", Schema::int())]);
        assert!(!plain.is_settable());
        assert!(plain.create_instance().is_none());

        let native = RecordSchema::named("row", [("a", Schema::int())]);
        let inst = native.create_instance().unwrap();
        assert_eq!(inst.len(), 1);
        assert_eq!(inst.type_name(), "row");
    }

    #[test]
    fn test_display_type_string() {
        let s = Schema::record([
            ("name", Schema::string()),
            (
                "address",
                Schema::record([("city", Schema::string()), ("is_asia", Schema::boolean())]),
            ),
        ]);
        assert_eq!(
            s.to_string(),
            "struct<name:string,address:struct<city:string,is_asia:boolean>>"
        );
        assert_eq!(s.category(), Category::Record);
        assert_eq!(Schema::int().category(), Category::Leaf);
    }
}
