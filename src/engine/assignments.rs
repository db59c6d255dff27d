use crate::config::CaseMatch;
use crate::error::{EngineError, EngineResult};
use crate::path::Path;
use crate::value::Value;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

/// A batch of `path → new value` writes.
///
/// Kept in insertion order. Inserting a path equal to an existing one
/// replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct Assignments {
    entries: Vec<(Path, Value)>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous value for an identical path.
    pub fn insert(&mut self, path: Path, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((path, value));
                None
            }
        }
    }

    /// Parse `key` and insert.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> EngineResult<Self> {
        self.insert(Path::parse(key)?, value);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Value)> {
        self.entries.iter().map(|(p, v)| (p, v))
    }
}

impl FromIterator<(Path, Value)> for Assignments {
    fn from_iter<I: IntoIterator<Item = (Path, Value)>>(iter: I) -> Self {
        let mut out = Assignments::new();
        for (path, value) in iter {
            out.insert(path, value);
        }
        out
    }
}

// ─── Lookup index used during a transform walk ──────────────────────────────

/// Folded targets plus the set of every strict ancestor of a target.
pub(crate) struct AssignmentIndex<'a> {
    targets: FxHashMap<Path, &'a Value>,
    ancestors: FxHashSet<Path>,
}

impl<'a> AssignmentIndex<'a> {
    pub(crate) fn build(assignments: &'a Assignments, case: CaseMatch) -> EngineResult<Self> {
        let mut targets: FxHashMap<Path, &'a Value> = FxHashMap::default();
        for (path, value) in assignments.iter() {
            // Later entries win when two keys fold to the same path.
            targets.insert(path.folded(case), value);
        }

        let mut ancestors: FxHashSet<Path> = FxHashSet::default();
        for path in targets.keys() {
            for len in 1..path.len() {
                ancestors.insert(path.truncated(len));
            }
        }

        if let Some(ancestor) = targets.keys().find(|p| ancestors.contains(*p)) {
            let descendant = targets
                .keys()
                .find(|p| ancestor.is_strict_prefix_of(p))
                .map(|p| SmolStr::from(p.to_string()))
                .unwrap_or_default();
            return Err(EngineError::OverlappingAssignments {
                ancestor: SmolStr::from(ancestor.to_string()),
                descendant,
            });
        }

        Ok(Self { targets, ancestors })
    }

    #[inline]
    pub(crate) fn target(&self, path: &Path) -> Option<&'a Value> {
        self.targets.get(path).copied()
    }

    /// Whether some target lies strictly below `path`.
    #[inline]
    pub(crate) fn reaches_into(&self, path: &Path) -> bool {
        self.ancestors.contains(path)
    }

    pub(crate) fn len(&self) -> usize {
        self.targets.len()
    }
}
