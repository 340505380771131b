//! Memoization: bounded recency caches for pure functions, interning
//! of immutable values, and invalidation across a pool of workers.

pub mod cached;
pub mod intern;
pub mod key;
pub mod lru;
pub mod pool;

pub use cached::{Memoized, clear_local_caches, local_cache_info};
pub use intern::{Interned, sweep_interned, interned_len, clear_interned};
pub use key::{CacheKey, KeyEncodingError};
pub use lru::{LruCache, CacheInfo, DEFAULT_CAPACITY};
pub use pool::{WorkerPool, ThreadPool, PoolError, invalidate_cache};
