//! Reusable object pools.
//!
//! A generic [`Pool<T>`] backs two specializations: a bucketed
//! [`BufferPool`] for byte buffers (used by the wrapper runtime's child
//! output capture) and the pre-shaped [`ParseResultPool`] (used by
//! [`crate::parser::parse`] to draw a [`crate::parser::ParseResult`] and
//! by [`crate::parser::ParseResult::discard`] to hand it back). Both are
//! safe to share between concurrent parses: the only shared mutable state
//! a pool holds is its own free list, guarded by a mutex.

use std::sync::Mutex;

/// Generic object pool with a factory, optional reset hook, and optional
/// upper bound on retained objects.
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
    factory: Box<dyn Fn() -> T + Send + Sync>,
    reset: Option<Box<dyn Fn(&mut T) + Send + Sync>>,
    cleanup: Option<Box<dyn Fn(T) + Send + Sync>>,
    max: Option<usize>,
}

impl<T> Pool<T> {
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Pool {
            free: Mutex::new(Vec::new()),
            factory: Box::new(factory),
            reset: None,
            cleanup: None,
            max: None,
        }
    }

    #[must_use]
    pub fn with_reset(mut self, reset: impl Fn(&mut T) + Send + Sync + 'static) -> Self {
        self.reset = Some(Box::new(reset));
        self
    }

    #[must_use]
    pub fn with_cleanup(mut self, cleanup: impl Fn(T) + Send + Sync + 'static) -> Self {
        self.cleanup = Some(Box::new(cleanup));
        self
    }

    #[must_use]
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Take an object from the pool, resetting it first, or build a fresh
    /// one if the pool is empty.
    pub fn get(&self) -> T {
        let popped = self.free.lock().unwrap().pop();
        match popped {
            Some(mut obj) => {
                if let Some(reset) = &self.reset {
                    reset(&mut obj);
                }
                obj
            }
            None => (self.factory)(),
        }
    }

    /// Return an object to the pool. If the pool is already at its
    /// configured maximum, the object is dropped (running its cleanup hook
    /// first, if one is configured) instead of retained.
    pub fn put(&self, obj: T) {
        let mut free = self.free.lock().unwrap();
        if let Some(max) = self.max {
            if free.len() >= max {
                drop(free);
                if let Some(cleanup) = &self.cleanup {
                    cleanup(obj);
                }
                return;
            }
        }
        free.push(obj);
    }

    #[cfg(test)]
    pub fn retained(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}

/// Byte-buffer capacity classes a [`BufferPool`] buckets by.
const BUCKETS: [usize; 7] = [64, 128, 256, 512, 1024, 2048, 4096];

fn bucket_for(min_capacity: usize) -> usize {
    BUCKETS
        .iter()
        .copied()
        .find(|&cap| cap >= min_capacity)
        .unwrap_or_else(|| min_capacity.next_power_of_two().max(*BUCKETS.last().unwrap()))
}

/// A pool of byte buffers bucketed by capacity class, so a request for "a
/// buffer of at least N bytes" doesn't force every caller into a single
/// oversized or undersized bucket.
pub struct BufferPool {
    buckets: [Pool<Vec<u8>>; BUCKETS.len()],
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    pub fn new() -> Self {
        BufferPool {
            buckets: BUCKETS.map(|cap| {
                Pool::new(move || Vec::with_capacity(cap)).with_reset(|buf: &mut Vec<u8>| buf.clear())
            }),
        }
    }

    pub fn get(&self, min_capacity: usize) -> Vec<u8> {
        let target = bucket_for(min_capacity);
        match BUCKETS.iter().position(|&cap| cap == target) {
            Some(idx) => self.buckets[idx].get(),
            None => Vec::with_capacity(min_capacity),
        }
    }

    pub fn put(&self, buf: Vec<u8>) {
        let cap = buf.capacity();
        if let Some(idx) = BUCKETS.iter().rposition(|&bucket| bucket <= cap) {
            self.buckets[idx].put(buf);
        }
        // larger than every bucket: let it drop, nothing to bucket it into.
    }
}

static GLOBAL_BUFFERS: once_cell::sync::Lazy<BufferPool> = once_cell::sync::Lazy::new(BufferPool::new);

/// The process-wide byte-buffer pool.
pub fn buffers() -> &'static BufferPool {
    &GLOBAL_BUFFERS
}

/// A pool of pre-shaped [`crate::parser::ParseResult`]s. Its reset hook
/// clears every keyed map and vector in place (see
/// [`crate::parser::ParseResult::reset`]) instead of rebuilding them, so a
/// hot parse loop reuses the same `HashMap`/`Vec` allocations parse after
/// parse.
pub struct ParseResultPool {
    inner: Pool<crate::parser::ParseResult>,
}

impl Default for ParseResultPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseResultPool {
    pub fn new() -> Self {
        ParseResultPool {
            inner: Pool::new(crate::parser::ParseResult::empty)
                .with_reset(|r: &mut crate::parser::ParseResult| r.reset()),
        }
    }

    /// Take a reset (or freshly built) `ParseResult` from the pool.
    pub fn get(&self) -> crate::parser::ParseResult {
        self.inner.get()
    }

    /// Return a `ParseResult` to the pool for a later parse to reuse.
    pub fn put(&self, result: crate::parser::ParseResult) {
        self.inner.put(result);
    }
}

static GLOBAL_PARSE_RESULTS: once_cell::sync::Lazy<ParseResultPool> =
    once_cell::sync::Lazy::new(ParseResultPool::new);

/// The process-wide [`crate::parser::ParseResult`] pool.
pub fn parse_results() -> &'static ParseResultPool {
    &GLOBAL_PARSE_RESULTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reused_object_is_reset_not_rebuilt() {
        let pool = Pool::new(Vec::<u8>::new).with_reset(|v: &mut Vec<u8>| v.clear());

        let mut a = pool.get();
        a.push(1);
        let cap = a.capacity();
        pool.put(a);
        let b = pool.get();
        assert!(b.is_empty());
        assert!(b.capacity() >= cap);
    }

    #[test]
    fn put_above_max_is_discarded() {
        let pool = Pool::new(Vec::<u8>::new).with_max(1);
        pool.put(vec![1]);
        pool.put(vec![2]);
        assert_eq!(pool.retained(), 1);
    }

    #[test]
    fn buffer_pool_buckets_by_capacity_class() {
        let pool = BufferPool::new();
        let buf = pool.get(100);
        assert!(buf.capacity() >= 100);
        pool.put(buf);
        let buf2 = pool.get(50);
        assert!(buf2.capacity() >= 50);
    }

    #[test]
    fn parse_result_pool_resets_in_place() {
        let pool = ParseResultPool::new();
        let mut r = pool.get();
        r.set("name", crate::model::Value::Str("Alice".into()));
        r.set_positional("target", crate::model::Value::Str("web-1".into()));
        pool.put(r);

        let reused = pool.get();
        assert!(reused.get("name").is_none());
        assert!(reused.positional("target").is_none());
        assert!(reused.command_path.is_empty());
    }

    #[test]
    fn parse_draws_from_and_discard_returns_to_the_pool() {
        let app = crate::model::Application::new("app").flag(crate::model::Flag::new(
            "verbose",
            crate::model::value::Kind::Bool,
        ));
        let before = parse_results().inner.retained();
        let result = crate::parser::parse(&app, &["--verbose".to_string()]).unwrap();
        result.discard();
        assert!(parse_results().inner.retained() >= before);
    }
}
