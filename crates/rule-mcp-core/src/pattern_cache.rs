//! Bounded cache of compiled rule patterns

use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;

/// Compiled regexes keyed by pattern text.
///
/// When the cache reaches capacity it is cleared wholesale before the next
/// insert. Patterns that fail to compile are never stored.
#[derive(Debug)]
pub struct PatternCache {
    capacity: usize,
    entries: RwLock<HashMap<String, Regex>>,
}

impl PatternCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the compiled pattern, compiling and caching it on a miss
    pub fn get_or_compile(&self, pattern: &str) -> Result<Regex, regex::Error> {
        if let Some(re) = self.entries.read().get(pattern) {
            return Ok(re.clone());
        }

        let re = Regex::new(pattern)?;
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            entries.clear();
        }
        entries.insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_returns_same_pattern() {
        let cache = PatternCache::new(4);
        let a = cache.get_or_compile(r"eval\(").unwrap();
        let b = cache.get_or_compile(r"eval\(").unwrap();
        assert_eq!(a.as_str(), b.as_str());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_not_cached() {
        let cache = PatternCache::new(4);
        assert!(cache.get_or_compile("(unclosed").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clears_when_full() {
        let cache = PatternCache::new(2);
        cache.get_or_compile("a").unwrap();
        cache.get_or_compile("b").unwrap();
        assert_eq!(cache.len(), 2);
        cache.get_or_compile("c").unwrap();
        assert_eq!(cache.len(), 1);
    }
}
