//! Memoized conversion strategies
//!
//! A strategy is a function built once per `(schema node, nullable)` pair and
//! reused for every value converted through that node. Nodes are keyed by
//! `Arc` address; the cache keeps each keyed node alive so addresses are never
//! reused while an entry exists.
//!
//! Building a strategy for a recursive schema re-enters the cache for the
//! node currently being built. That re-entry is detected per thread and
//! answered with a deferred strategy which looks the finished entry up at call
//! time instead of building it again.
//!
//! Copyright (c) 2025 Swagmap Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::spec::Spec;
use crate::value::Value;
use serde_json::Value as Json;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, ThreadId};

pub type UnmarshalFn = dyn Fn(&Spec, &Json) -> Result<Value> + Send + Sync;
pub type MarshalFn = dyn Fn(&Spec, &Value) -> Result<Json> + Send + Sync;

/// Wire to native conversion for one schema node
pub type UnmarshalStrategy = Arc<UnmarshalFn>;
/// Native to wire conversion for one schema node
pub type MarshalStrategy = Arc<MarshalFn>;

type CacheKey = (usize, bool);

fn cache_key(schema: &Schema, nullable: bool) -> CacheKey {
    (Arc::as_ptr(schema) as usize, nullable)
}

/// Strategies keyed by node identity and nullability
pub struct StrategyCache<T: ?Sized> {
    built: RwLock<HashMap<CacheKey, (Schema, Arc<T>)>>,
    in_progress: Mutex<HashSet<(CacheKey, ThreadId)>>,
}

impl<T: ?Sized> Default for StrategyCache<T> {
    fn default() -> Self {
        Self {
            built: RwLock::new(HashMap::new()),
            in_progress: Mutex::new(HashSet::new()),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for StrategyCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyCache").field("len", &self.len()).finish()
    }
}

/// Clears the in-progress mark however the build ends
struct BuildGuard<'a> {
    in_progress: &'a Mutex<HashSet<(CacheKey, ThreadId)>>,
    mark: (CacheKey, ThreadId),
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        let mut in_progress = match self.in_progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        in_progress.remove(&self.mark);
    }
}

impl<T: ?Sized> StrategyCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached strategy for `schema`, building it on first use
    ///
    /// `deferred` is called instead of `build` when this thread is already
    /// building the same key further up the stack. When two threads race on
    /// the first build, the first insert wins and the other result is
    /// discarded.
    pub fn get_or_build<B, D>(&self, schema: &Schema, nullable: bool, build: B, deferred: D) -> Result<Arc<T>>
    where
        B: FnOnce() -> Result<Arc<T>>,
        D: FnOnce() -> Arc<T>,
    {
        let key = cache_key(schema, nullable);
        if let Some((_, strategy)) = self.read()?.get(&key) {
            return Ok(strategy.clone());
        }

        let mark = (key, thread::current().id());
        {
            let mut in_progress = self
                .in_progress
                .lock()
                .map_err(|_| Error::internal("strategy build set poisoned"))?;
            if !in_progress.insert(mark) {
                return Ok(deferred());
            }
        }
        let guard = BuildGuard {
            in_progress: &self.in_progress,
            mark,
        };

        let strategy = build()?;
        drop(guard);

        let mut built = self
            .built
            .write()
            .map_err(|_| Error::internal("strategy cache poisoned"))?;
        let (_, stored) = built.entry(key).or_insert_with(|| (schema.clone(), strategy));
        Ok(stored.clone())
    }

    pub fn get(&self, schema: &Schema, nullable: bool) -> Option<Arc<T>> {
        self.read()
            .ok()?
            .get(&cache_key(schema, nullable))
            .map(|(_, strategy)| strategy.clone())
    }

    pub fn len(&self) -> usize {
        self.read().map(|built| built.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.built.write() {
            Ok(mut built) => built.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<CacheKey, (Schema, Arc<T>)>>> {
        self.built
            .read()
            .map_err(|_| Error::internal("strategy cache poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaNode;
    use serde_json::json;
    use std::cell::Cell;
    use std::sync::Barrier;

    type Counter = dyn Fn() -> usize + Send + Sync;

    fn node() -> Schema {
        SchemaNode::parse(&json!({"type": "string"}), None).unwrap()
    }

    #[test]
    fn test_builds_once_per_key() {
        let cache: StrategyCache<Counter> = StrategyCache::new();
        let schema = node();
        let builds = Cell::new(0);

        for _ in 0..3 {
            let strategy = cache
                .get_or_build(
                    &schema,
                    false,
                    || {
                        builds.set(builds.get() + 1);
                        Ok(Arc::new(|| 1usize) as Arc<Counter>)
                    },
                    || unreachable!(),
                )
                .unwrap();
            assert_eq!(strategy(), 1);
        }
        assert_eq!(builds.get(), 1);

        // nullability is part of the key
        cache
            .get_or_build(&schema, true, || Ok(Arc::new(|| 2usize) as Arc<Counter>), || unreachable!())
            .unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reentrant_build_is_deferred() {
        let cache: StrategyCache<Counter> = StrategyCache::new();
        let schema = node();

        let outer = cache
            .get_or_build(
                &schema,
                false,
                || {
                    let inner = cache.get_or_build(
                        &schema,
                        false,
                        || panic!("re-entrant build must not run"),
                        || Arc::new(|| 7usize) as Arc<Counter>,
                    )?;
                    assert_eq!(inner(), 7);
                    Ok(Arc::new(|| 1usize) as Arc<Counter>)
                },
                || unreachable!(),
            )
            .unwrap();
        assert_eq!(outer(), 1);
        assert!(cache.get(&schema, false).is_some());
    }

    #[test]
    fn test_failed_build_can_be_retried() {
        let cache: StrategyCache<Counter> = StrategyCache::new();
        let schema = node();

        let failed = cache.get_or_build(&schema, false, || Err(Error::mapping("boom")), || unreachable!());
        assert!(failed.is_err());
        assert!(cache.is_empty());

        let strategy = cache
            .get_or_build(&schema, false, || Ok(Arc::new(|| 3usize) as Arc<Counter>), || unreachable!())
            .unwrap();
        assert_eq!(strategy(), 3);
    }

    #[test]
    fn test_distinct_nodes_are_distinct_keys() {
        let cache: StrategyCache<Counter> = StrategyCache::new();
        let (a, b) = (node(), node());
        cache
            .get_or_build(&a, false, || Ok(Arc::new(|| 1usize) as Arc<Counter>), || unreachable!())
            .unwrap();
        assert!(cache.get(&b, false).is_none());
        cache.clear();
        assert!(cache.get(&a, false).is_none());
    }

    #[test]
    fn test_concurrent_first_build_keeps_one_entry() {
        let cache: StrategyCache<Counter> = StrategyCache::new();
        let schema = node();
        let barrier = Barrier::new(4);
        let (cache, schema, barrier) = (&cache, &schema, &barrier);

        let results: Vec<Arc<Counter>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4usize)
                .map(|i| {
                    scope.spawn(move || {
                        cache
                            .get_or_build(
                                schema,
                                false,
                                || {
                                    // every thread builds before any insert
                                    barrier.wait();
                                    Ok(Arc::new(move || i) as Arc<Counter>)
                                },
                                || unreachable!(),
                            )
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        let stored = cache.get(schema, false).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(results.iter().all(|strategy| Arc::ptr_eq(strategy, &stored)));
    }
}
