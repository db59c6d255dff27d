//! Dotted field paths.
//!
//! A path is a non-empty sequence of field-name segments separated by `.`,
//! e.g. `address.city`. A literal dot inside a field name is written `\.`
//! and a literal backslash `\\`; other backslashes are kept as-is.

use crate::config::CaseMatch;
use crate::error::{EngineError, EngineResult};
use arrayvec::ArrayVec;
use lru::LruCache;
use smol_str::SmolStr;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use tracing::trace;

/// Deepest path accepted. Segments live inline, no heap allocation.
pub const MAX_PATH_DEPTH: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path {
    segments: ArrayVec<SmolStr, MAX_PATH_DEPTH>,
}

impl Path {
    /// Parse a dotted key into segments.
    pub fn parse(input: &str) -> EngineResult<Self> {
        if input.is_empty() {
            return Err(EngineError::EmptyPath);
        }

        let mut segments: Vec<SmolStr> = Vec::new();
        let mut current = String::new();
        let mut chars = input.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.peek() {
                    Some(&next) if next == '.' || next == '\\' => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                },
                '.' => {
                    if current.is_empty() {
                        return Err(EngineError::EmptySegment { path: input.into() });
                    }
                    segments.push(SmolStr::from(std::mem::take(&mut current)));
                }
                _ => current.push(c),
            }
        }
        if current.is_empty() {
            return Err(EngineError::EmptySegment { path: input.into() });
        }
        segments.push(SmolStr::from(current));

        Self::from_segments(segments)
    }

    /// Build a path from already-split segment names.
    pub fn from_segments<S: Into<SmolStr>>(
        segments: impl IntoIterator<Item = S>,
    ) -> EngineResult<Self> {
        let segments: Vec<SmolStr> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(EngineError::EmptyPath);
        }
        if segments.len() > MAX_PATH_DEPTH {
            return Err(EngineError::PathTooDeep {
                depth: segments.len(),
                max: MAX_PATH_DEPTH,
            });
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(EngineError::EmptySegment {
                path: SmolStr::from(segments.join(".")),
            });
        }
        Ok(Self {
            segments: segments.into_iter().collect(),
        })
    }

    /// The empty path, used as the root of a walk.
    pub(crate) fn root() -> Self {
        Self {
            segments: ArrayVec::new(),
        }
    }

    /// The first `len` segments.
    pub(crate) fn truncated(&self, len: usize) -> Path {
        Path {
            segments: self.segments.iter().take(len).cloned().collect(),
        }
    }

    pub(crate) fn push(&mut self, segment: SmolStr) -> EngineResult<()> {
        self.segments
            .try_push(segment)
            .map_err(|_| EngineError::PathTooDeep {
                depth: MAX_PATH_DEPTH + 1,
                max: MAX_PATH_DEPTH,
            })
    }

    pub(crate) fn pop(&mut self) -> Option<SmolStr> {
        self.segments.pop()
    }

    #[inline]
    pub fn segments(&self) -> &[SmolStr] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Strict prefix test: `a` is a prefix of `a.b` but not of `a`.
    pub fn is_strict_prefix_of(&self, other: &Path) -> bool {
        self.len() < other.len() && other.segments[..self.len()] == self.segments[..]
    }

    /// The normalized form used as an assignment key.
    pub fn folded(&self, case: CaseMatch) -> Path {
        Path {
            segments: self.segments.iter().map(|s| case.fold(s)).collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            for c in seg.chars() {
                match c {
                    '.' => f.write_str("\\.")?,
                    '\\' => f.write_str("\\\\")?,
                    _ => write!(f, "{c}")?,
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

// ─── PathCache ──────────────────────────────────────────────────────────────

/// Memoizes parses of key strings that repeat across rows.
pub struct PathCache {
    cache: LruCache<SmolStr, Path>,
}

impl PathCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn get_or_parse(&mut self, key: &str) -> EngineResult<Path> {
        if let Some(path) = self.cache.get(key) {
            return Ok(path.clone());
        }
        trace!(key, "path cache miss");
        let path = Path::parse(key)?;
        self.cache.put(SmolStr::from(key), path.clone());
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(p: &Path) -> Vec<&str> {
        p.segments().iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_single_and_nested() {
        assert_eq!(segs(&Path::parse("age").unwrap()), vec!["age"]);
        assert_eq!(
            segs(&Path::parse("address.city").unwrap()),
            vec!["address", "city"]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert!(matches!(Path::parse(""), Err(EngineError::EmptyPath)));
        for bad in ["a..b", ".a", "a.", "."] {
            assert!(
                matches!(Path::parse(bad), Err(EngineError::EmptySegment { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_escaped_dot() {
        let p = Path::parse(r"meta.build\.id").unwrap();
        assert_eq!(segs(&p), vec!["meta", "build.id"]);
        assert_eq!(p.to_string(), r"meta.build\.id");
    }

    #[test]
    fn test_backslash_sequences() {
        assert_eq!(segs(&Path::parse(r"a\\b").unwrap()), vec![r"a\b"]);
        assert_eq!(segs(&Path::parse(r"a\nb").unwrap()), vec![r"a\nb"]);
        assert_eq!(segs(&Path::parse(r"a\").unwrap()), vec![r"a\"]);
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["a", "a.b.c", r"x\.y.z", r"back\\slash"] {
            let p = Path::parse(raw).unwrap();
            assert_eq!(Path::parse(&p.to_string()).unwrap(), p);
        }
    }

    #[test]
    fn test_depth_limit() {
        let ok = vec!["s"; MAX_PATH_DEPTH].join(".");
        assert_eq!(Path::parse(&ok).unwrap().len(), MAX_PATH_DEPTH);

        let deep = vec!["s"; MAX_PATH_DEPTH + 1].join(".");
        assert!(matches!(
            Path::parse(&deep),
            Err(EngineError::PathTooDeep { depth: 33, max: 32 })
        ));
    }

    #[test]
    fn test_prefix_and_fold() {
        let a = Path::parse("Address").unwrap();
        let ab = Path::parse("address.City").unwrap();
        assert!(!a.is_strict_prefix_of(&ab));
        assert!(a
            .folded(CaseMatch::Insensitive)
            .is_strict_prefix_of(&ab.folded(CaseMatch::Insensitive)));
        assert!(!ab.is_strict_prefix_of(&ab));
    }

    #[test]
    fn test_cache_hits_and_evicts() {
        let mut cache = PathCache::new(NonZeroUsize::new(2).unwrap());
        let p = cache.get_or_parse("a.b").unwrap();
        assert_eq!(p.len(), 2);
        cache.get_or_parse("a.b").unwrap();
        assert_eq!(cache.len(), 1);
        cache.get_or_parse("c").unwrap();
        cache.get_or_parse("d").unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get_or_parse("").is_err());
        assert_eq!(cache.len(), 2);
    }
}
