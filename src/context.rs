use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{Result, RuleError};

pub const DEFAULT_CACHE_CAPACITY: usize = 100;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Engine options. Every key is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    /// Maximum number of compiled expressions kept in the cache.
    pub cache_capacity: usize,
    /// Seconds a compiled expression stays valid after it was built.
    pub cache_ttl_secs: u64,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl Context {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RuleError::InvalidDocument(format!("config: {e}")))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let ctx = Context::from_json(r#"{"cache_capacity": 5}"#).unwrap();
        assert_eq!(ctx.cache_capacity, 5);
        assert_eq!(ctx.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
    }

    #[test]
    fn bad_json_is_invalid_document() {
        let err = Context::from_json("{").unwrap_err();
        assert!(matches!(err, RuleError::InvalidDocument(_)));
    }
}
