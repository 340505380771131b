use super::key::{CacheKey, KeyEncodingError};
use super::lru::{LruCache, CacheInfo, DEFAULT_CAPACITY};
use super::intern;

use serde::Serialize;
use tracing::{debug, trace};

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
  /// Every memoized function's cache on this thread, keyed by function
  /// name, argument type and result type.
  static CACHES: RefCell<HashMap<(&'static str, TypeId, TypeId), Box<dyn ErasedCache>>> =
    RefCell::new(HashMap::new());
}

trait ErasedCache {
  fn clear(&mut self);
  fn cache_info(&self) -> CacheInfo;
  fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<R: 'static> ErasedCache for LruCache<CacheKey, R> {
  fn clear(&mut self) {
    LruCache::clear(self)
  }

  fn cache_info(&self) -> CacheInfo {
    LruCache::cache_info(self)
  }

  fn as_any_mut(&mut self) -> &mut dyn Any {
    self
  }
}

/// A pure function together with a bounded recency cache of its
/// results.
///
/// Each thread has its own cache for each memoized function, created
/// on first use. Since a `Memoized` holds only a name and a function
/// pointer, it is usually declared as a `static`:
///
/// ```ignore
/// fn square(x: u64) -> u64 { x * x }
/// static SQUARE: Memoized<u64, u64> = Memoized::new("square", square);
/// assert_eq!(SQUARE.call(12)?, 144);
/// ```
///
/// The function name is part of every cache key. Two memoized
/// functions share a cache only if their names, argument types and
/// result types all agree.
pub struct Memoized<A, R> {
  name: &'static str,
  capacity: usize,
  func: fn(A) -> R,
}

impl<A, R> Memoized<A, R> {
  pub const fn new(name: &'static str, func: fn(A) -> R) -> Self {
    Memoized::with_capacity(name, DEFAULT_CAPACITY, func)
  }

  pub const fn with_capacity(name: &'static str, capacity: usize, func: fn(A) -> R) -> Self {
    Memoized { name, capacity, func }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl<A: Serialize + 'static, R: Clone + 'static> Memoized<A, R> {
  /// Calls the function, or returns the result of an earlier call with
  /// the same arguments.
  ///
  /// The cache is not borrowed while the function runs, so the
  /// function may itself make memoized calls, including to itself.
  pub fn call(&self, args: A) -> Result<R, KeyEncodingError> {
    let key = CacheKey::encode(self.name, &args)?;
    if let Some(result) = self.with_cache(|cache| cache.get(&key).cloned()) {
      trace!(name = self.name, "Cache hit");
      return Ok(result);
    }
    trace!(name = self.name, "Cache miss");
    let result = (self.func)(args);
    self.with_cache(|cache| cache.insert(key, result.clone()));
    Ok(result)
  }

  /// Counters of this thread's cache.
  pub fn cache_info(&self) -> CacheInfo {
    self.with_cache(|cache| cache.cache_info())
  }

  /// Empties this thread's cache and resets its counters.
  pub fn cache_clear(&self) {
    self.with_cache(|cache| cache.clear())
  }

  fn with_cache<T>(&self, f: impl FnOnce(&mut LruCache<CacheKey, R>) -> T) -> T {
    CACHES.with(|caches| {
      let mut caches = caches.borrow_mut();
      let erased = caches
        .entry((self.name, TypeId::of::<A>(), TypeId::of::<R>()))
        .or_insert_with(|| Box::new(LruCache::<CacheKey, R>::new(self.capacity)));
      let cache = erased
        .as_any_mut()
        .downcast_mut::<LruCache<CacheKey, R>>()
        .expect("cache registered under its own result type");
      f(cache)
    })
  }
}

/// Counters of every memoized function used on this thread, by name.
pub fn local_cache_info() -> Vec<(&'static str, CacheInfo)> {
  CACHES.with(|caches| {
    let mut info: Vec<_> = caches
      .borrow()
      .iter()
      .map(|(&(name, _, _), cache)| (name, cache.cache_info()))
      .collect();
    info.sort_by_key(|(name, _)| *name);
    info
  })
}

/// Clears every memoized cache and the interning table of this
/// thread.
pub fn clear_local_caches() {
  let count = CACHES.with(|caches| {
    let mut caches = caches.borrow_mut();
    for cache in caches.values_mut() {
      cache.clear();
    }
    caches.len()
  });
  intern::clear_interned();
  debug!(caches = count, "Cleared local memoization state");
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memo::key::tests::Unencodable;

  use std::cell::Cell;

  thread_local! {
    static CALLS: Cell<u32> = const { Cell::new(0) };
  }

  fn counted_square(x: i64) -> i64 {
    CALLS.with(|calls| calls.set(calls.get() + 1));
    x * x
  }

  fn calls() -> u32 {
    CALLS.with(|calls| calls.get())
  }

  static SQUARE: Memoized<i64, i64> = Memoized::new("test_square", counted_square);

  #[test]
  fn test_memoized_call_is_transparent() {
    assert_eq!(SQUARE.call(3), Ok(9));
    assert_eq!(SQUARE.call(3), Ok(9));
    assert_eq!(SQUARE.call(-4), Ok(16));
    assert_eq!(calls(), 2);
    let info = SQUARE.cache_info();
    assert_eq!((info.hits, info.misses, info.currsize), (1, 2, 2));
  }

  #[test]
  fn test_cache_clear() {
    fn cube(x: i64) -> i64 {
      x * x * x
    }
    static CUBE: Memoized<i64, i64> = Memoized::new("test_cube", cube);
    CUBE.call(2).unwrap();
    CUBE.call(2).unwrap();
    CUBE.cache_clear();
    assert_eq!(CUBE.cache_info(), CacheInfo { hits: 0, misses: 0, currsize: 0, capacity: DEFAULT_CAPACITY });
  }

  #[test]
  fn test_capacity_bounds_cache() {
    fn succ(x: u32) -> u32 {
      x + 1
    }
    static SMALL: Memoized<u32, u32> = Memoized::with_capacity("test_small", 2, succ);
    for i in 0..10 {
      SMALL.call(i).unwrap();
    }
    assert_eq!(SMALL.cache_info().currsize, 2);
  }

  #[test]
  fn test_recursive_memoized_call() {
    static FIB: Memoized<u64, u64> = Memoized::new("test_fib", fib);
    fn fib(n: u64) -> u64 {
      if n < 2 { n } else { FIB.call(n - 1).unwrap() + FIB.call(n - 2).unwrap() }
    }
    assert_eq!(FIB.call(80), Ok(23416728348467685));
    assert_eq!(FIB.cache_info().currsize, 81);
  }

  #[test]
  fn test_key_encoding_error() {
    fn first((x, _): (i32, Unencodable)) -> i32 {
      x
    }
    static OPAQUE: Memoized<(i32, Unencodable), i32> = Memoized::new("test_opaque", first);
    let err = OPAQUE.call((1, Unencodable)).unwrap_err();
    assert_eq!(err.name, "test_opaque");
    assert_eq!(OPAQUE.cache_info().currsize, 0);
  }

  #[test]
  fn test_same_name_different_argument_types() {
    fn widen_byte(x: u8) -> u32 {
      u32::from(x) + 1000
    }
    fn widen_short(x: u16) -> u32 {
      u32::from(x) + 2000
    }
    static BYTE: Memoized<u8, u32> = Memoized::new("test_widen", widen_byte);
    static SHORT: Memoized<u16, u32> = Memoized::new("test_widen", widen_short);
    assert_eq!(BYTE.call(7), Ok(1007));
    assert_eq!(SHORT.call(7), Ok(2007));
    assert_eq!(BYTE.call(7), Ok(1007));
    assert_eq!(BYTE.cache_info().currsize, 1);
    assert_eq!(SHORT.cache_info().currsize, 1);
  }

  #[test]
  fn test_caches_are_per_thread() {
    fn double(x: i32) -> i32 {
      x * 2
    }
    static DOUBLE: Memoized<i32, i32> = Memoized::new("test_double", double);
    DOUBLE.call(1).unwrap();
    let other = std::thread::spawn(|| DOUBLE.cache_info()).join().unwrap();
    assert_eq!(other.currsize, 0);
    assert_eq!(DOUBLE.cache_info().currsize, 1);
  }

  #[test]
  fn test_clear_local_caches() {
    fn half(x: i32) -> i32 {
      x / 2
    }
    fn negate(x: i32) -> i32 {
      -x
    }
    static HALF: Memoized<i32, i32> = Memoized::new("test_half", half);
    static NEGATE: Memoized<i32, i32> = Memoized::new("test_negate", negate);
    HALF.call(10).unwrap();
    NEGATE.call(10).unwrap();
    let names: Vec<_> = local_cache_info().into_iter().map(|(name, _)| name).collect();
    assert!(names.contains(&"test_half") && names.contains(&"test_negate"));
    clear_local_caches();
    assert_eq!(HALF.cache_info().currsize, 0);
    assert_eq!(NEGATE.cache_info().currsize, 0);
  }
}
