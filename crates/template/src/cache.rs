//! Process-lifetime cache of compiled templates keyed by content hash.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::{CompiledTemplate, TemplateCompiler, TemplateSettings, hash};

/// Counters describing cache behaviour, mainly for instrumentation and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of distinct compiled bodies held.
    pub entries: usize,
    /// Number of times the compiler ran.
    pub compilations: u64,
    /// Number of lookups served from the cache.
    pub hits: u64,
}

/// Never-evicting cache mapping `hash(body)` to compiled templates.
///
/// Each hash slot holds a small bucket compared by body, so two bodies with colliding hashes
/// never share a compiled program. Construct one per application and share it via `Arc`.
pub struct TemplateCache {
    compiler: TemplateCompiler,
    slots: Mutex<HashMap<String, Vec<Arc<CompiledTemplate>>>>,
    compilations: AtomicU64,
    hits: AtomicU64,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(TemplateCompiler::default())
    }
}

impl TemplateCache {
    /// Create an empty cache around `compiler`.
    pub fn new(compiler: TemplateCompiler) -> Self {
        Self {
            compiler,
            slots: Mutex::new(HashMap::new()),
            compilations: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Create an empty cache whose compiler enforces `settings`.
    pub fn with_settings(settings: TemplateSettings) -> Self {
        Self::new(TemplateCompiler::new(settings))
    }

    /// The compiler used for misses and for invoking cached entries.
    pub fn compiler(&self) -> &TemplateCompiler {
        &self.compiler
    }

    /// Get the compiled template for the cleaned `body`, compiling and caching on miss.
    pub fn get_or_compile(&self, body: &str) -> Arc<CompiledTemplate> {
        let key = hash(body);

        // Fast path: try cache
        if let Some(found) = self.lookup(&key, body) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return found;
        }

        // Compile outside the lock so slow bodies don't block other lookups.
        self.compilations.fetch_add(1, Ordering::Relaxed);
        let compiled = Arc::new(self.compiler.compile(body));

        // Insert, but check again in case another caller raced and inserted first.
        let mut slots = self.slots.lock();
        let bucket = slots.entry(key).or_default();
        if let Some(found) = bucket.iter().find(|e| e.body() == body) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return found.clone();
        }
        if !bucket.is_empty() {
            warn!(
                key = %hash(body),
                "template hash collision; keeping bodies in separate entries"
            );
        }
        bucket.push(compiled.clone());
        trace!(entries = bucket.len(), "template_cache_insert");
        compiled
    }

    /// Find an existing entry for `body` in slot `key`.
    fn lookup(&self, key: &str, body: &str) -> Option<Arc<CompiledTemplate>> {
        self.slots
            .lock()
            .get(key)
            .and_then(|bucket| bucket.iter().find(|e| e.body() == body).cloned())
    }

    /// Number of distinct bodies held.
    pub fn len(&self) -> usize {
        self.slots.lock().values().map(Vec::len).sum()
    }

    /// True when nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot the cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            compilations: self.compilations.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::TemplateCache;

    #[test]
    fn second_lookup_is_a_hit() {
        let cache = TemplateCache::default();
        let a = cache.get_or_compile("return 1");
        let b = cache.get_or_compile("return 1");
        assert!(Arc::ptr_eq(&a, &b));
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.compilations, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn distinct_bodies_get_distinct_entries() {
        let cache = TemplateCache::default();
        cache.get_or_compile("return 1");
        cache.get_or_compile("return 2");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn colliding_hashes_keep_separate_entries() {
        // "Aa" and "BB" share a 31-fold hash.
        assert_eq!(crate::hash("Aa"), crate::hash("BB"));
        let cache = TemplateCache::default();
        let a = cache.get_or_compile("Aa");
        let b = cache.get_or_compile("BB");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.body(), "Aa");
        assert_eq!(b.body(), "BB");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_first_use_stores_one_entry() {
        let cache = Arc::new(TemplateCache::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.get_or_compile("return states.len()"))
            })
            .collect();
        let first = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .reduce(|a, b| {
                assert!(Arc::ptr_eq(&a, &b));
                a
            })
            .expect("at least one");
        assert_eq!(first.body(), "return states.len()");
        assert_eq!(cache.len(), 1);
    }
}
