//! Cache invalidation across a pool of workers, each holding its own
//! memoization state and numeric context.

use roundoff::memo::{Memoized, PoolError, ThreadPool, WorkerPool, invalidate_cache, local_cache_info};
use roundoff::numeric::context;
use roundoff::{Env, Error, ErrorSemantics, NumericContext, error_eval, parse_expr};

use tracing_subscriber::EnvFilter;

fn init_logging() {
  // Several tests share the process, so only the first installs the
  // subscriber.
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::new("roundoff=debug"))
    .with_test_writer()
    .try_init();
}

fn working_precision(_: ()) -> u32 {
  context::current().precision()
}

static WORKING_PRECISION: Memoized<(), u32> = Memoized::new("working_precision", working_precision);

fn use_single_precision() {
  context::set_context(NumericContext::SINGLE);
}

fn precision_on(pool: &ThreadPool, index: usize) -> u32 {
  pool.evaluate_on(index, || WORKING_PRECISION.call(()).unwrap()).unwrap()
}

fn analyze(input: &'static str) -> ErrorSemantics {
  let env = Env::from_bounds([("a", ("0.1", "0.3")), ("b", ("-2", "5"))]).unwrap();
  error_eval(&parse_expr(input).unwrap(), &env).unwrap()
}

struct OfflinePool;

impl WorkerPool for OfflinePool {
  fn apply(&self, _action: fn()) -> Result<(), PoolError> {
    Err(PoolError::WorkerUnavailable(3))
  }
}

#[test]
fn stale_results_are_cleared_on_every_worker() {
  init_logging();
  let pool = ThreadPool::new(3).unwrap();
  for index in 0..3 {
    assert_eq!(precision_on(&pool, index), 53);
  }

  // Changing the context does not touch results cached under the old
  // one.
  pool.apply(use_single_precision).unwrap();
  for index in 0..3 {
    assert_eq!(precision_on(&pool, index), 53);
  }

  invalidate_cache(&pool).unwrap();
  for index in 0..3 {
    assert_eq!(precision_on(&pool, index), 24);
  }
}

#[test]
fn workers_agree_with_the_coordinator() {
  init_logging();
  let pool = ThreadPool::new(2).unwrap();
  let expected = analyze("a * b + a | (a + b) * a");
  for index in 0..2 {
    let result = pool.evaluate_on(index, || analyze("a * b + a | (a + b) * a")).unwrap();
    assert_eq!(result, expected);
  }

  invalidate_cache(&pool).unwrap();
  for index in 0..2 {
    let info = pool.evaluate_on(index, local_cache_info).unwrap();
    assert!(info.iter().all(|(_, info)| info.currsize == 0 && info.hits == 0 && info.misses == 0));
  }
  assert!(local_cache_info().iter().all(|(_, info)| info.currsize == 0));
}

#[test]
fn pool_failure_is_reported() {
  init_logging();
  WORKING_PRECISION.call(()).unwrap();
  let err = invalidate_cache(&OfflinePool).unwrap_err();
  assert_eq!(err, PoolError::WorkerUnavailable(3));
  assert!(matches!(Error::from(err), Error::Pool(_)));
  // The calling thread was cleared regardless.
  assert_eq!(WORKING_PRECISION.cache_info().currsize, 0);
}
