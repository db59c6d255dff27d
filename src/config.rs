use crate::error::{EngineError, EngineResult};
use serde::Deserialize;
use smol_str::SmolStr;
use std::num::NonZeroUsize;
use std::path::Path;

/// How path segments are compared against field names and JSON keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMatch {
    /// ASCII case folding.
    #[default]
    Insensitive,
    Sensitive,
}

impl CaseMatch {
    #[inline]
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            CaseMatch::Insensitive => a.eq_ignore_ascii_case(b),
            CaseMatch::Sensitive => a == b,
        }
    }

    /// Normalized form of a name under this policy.
    pub fn fold(self, s: &str) -> SmolStr {
        match self {
            CaseMatch::Insensitive if s.bytes().any(|b| b.is_ascii_uppercase()) => {
                SmolStr::from(s.to_ascii_lowercase())
            }
            _ => SmolStr::from(s),
        }
    }
}

pub const DEFAULT_PATH_CACHE_CAPACITY: usize = 64;

fn default_path_cache_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_PATH_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

fn default_share_untouched() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// One policy for read, transform and update.
    pub case_match: CaseMatch,
    /// Reuse sub-records no assignment reaches instead of rebuilding them.
    pub share_untouched: bool,
    /// Entries kept by each function facade's parsed-path cache.
    pub path_cache_capacity: NonZeroUsize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            case_match: CaseMatch::default(),
            share_untouched: default_share_untouched(),
            path_cache_capacity: default_path_cache_capacity(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::Config {
            reason: SmolStr::from(e.to_string()),
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_case_match(mut self, case_match: CaseMatch) -> Self {
        self.case_match = case_match;
        self
    }

    pub fn with_share_untouched(mut self, share: bool) -> Self {
        self.share_untouched = share;
        self
    }
}
