//! End-to-end scenarios across the numeric, interval, semantics, and
//! memoization layers.

use roundoff::interval::InvalidIntervalError;
use roundoff::memo::{LruCache, Memoized, CacheInfo};
use roundoff::numeric::context::with_context;
use roundoff::{
  Env, Error, ErrorSemantics, Exact, ExactInterval, Float, FloatInterval, Lattice, NumericContext,
  error_eval, parse_expr, round_off_error,
};

#[test]
fn single_precision_constant_squared() {
  let single = NumericContext::ieee(32).unwrap();
  with_context(single, || {
    let constant = ErrorSemantics::cast_constant("0.1").unwrap();
    let squared = &constant * &constant;
    assert_eq!(squared.v(), &FloatInterval::point(Float::from(0.1f32 * 0.1f32)));

    // A known constant carries less error than an input range around
    // it, before and after squaring.
    let range = ErrorSemantics::cast("0.1", "0.1").unwrap();
    assert_eq!(range.e(), &round_off_error(range.v()));
    assert!(constant.max_error() < range.max_error());
    assert!(squared.max_error() < (&range * &range).max_error());
    assert!(squared.max_error() < range.e().magnitude());
  });
}

#[test]
fn meet_of_disjoint_intervals_fails() {
  let a = ExactInterval::from_values(1, 5).unwrap();
  let b = ExactInterval::from_values(10, 20).unwrap();
  let err: InvalidIntervalError = a.meet(&b).unwrap_err();
  assert_eq!(err.to_string(), "Invalid interval: min 10 exceeds max 5");
  assert!(matches!(Error::from(err), Error::InvalidInterval(_)));
  // Overlapping intervals meet.
  let c = ExactInterval::from_values(3, 12).unwrap();
  assert_eq!(a.meet(&c).unwrap(), ExactInterval::from_values(3, 5).unwrap());
}

#[test]
fn lru_capacity_two_eviction() {
  let mut cache = LruCache::new(2);
  for key in ["A", "B", "C", "A"] {
    if cache.get(&key).is_none() {
      cache.insert(key, key.to_lowercase());
    }
  }
  assert_eq!(cache.keys_by_recency(), vec![&"A", &"C"]);
  assert!(!cache.contains_key(&"B"));
  // "A" was evicted by "C" before it was requested again.
  assert_eq!(cache.cache_info(), CacheInfo { hits: 0, misses: 4, currsize: 2, capacity: 2 });
}

#[test]
fn memoized_capacity_two_eviction() {
  fn label(key: char) -> String {
    key.to_string()
  }
  static LABEL: Memoized<char, String> = Memoized::with_capacity("scenario_label", 2, label);
  for key in ['A', 'B', 'A', 'C'] {
    assert_eq!(LABEL.call(key).unwrap(), key.to_string());
  }
  let info = LABEL.cache_info();
  assert_eq!((info.hits, info.misses, info.currsize), (1, 3, 2));
  // "B" was evicted, so calling it again misses while "A" still hits.
  LABEL.call('A').unwrap();
  assert_eq!(LABEL.cache_info().hits, 2);
  LABEL.call('B').unwrap();
  assert_eq!(LABEL.cache_info().misses, 4);
}

#[test]
fn parse_and_evaluate_expression() {
  let env = Env::from_bounds([("x", ("0.5", "1")), ("y", ("1", "2"))]).unwrap();
  let expr = parse_expr("(x + y) * x").unwrap();
  let result = error_eval(&expr, &env).unwrap();

  let x = env.get("x").unwrap();
  let y = env.get("y").unwrap();
  assert_eq!(result, &(x + y) * x);

  // Every true result lies within the reported bounds.
  let bounds = result.bounds();
  for (a, b) in [("0.5", "1"), ("1", "2"), ("0.75", "1.5")] {
    let (a, b) = (a.parse::<Exact>().unwrap(), b.parse::<Exact>().unwrap());
    let exact = &(&a + &b) * &a;
    assert!(bounds.min().to_exact() <= exact && exact <= bounds.max().to_exact());
  }
}

#[test]
fn barrier_joins_alternatives() {
  let env = Env::from_bounds([("a", (1, 2)), ("b", (3, 4))]).unwrap();
  let left = error_eval(&parse_expr("a * b + a").unwrap(), &env).unwrap();
  let right = error_eval(&parse_expr("a * (b + 1)").unwrap(), &env).unwrap();
  let both = error_eval(&parse_expr("a * b + a | a * (b + 1)").unwrap(), &env).unwrap();
  assert_eq!(both, left.join(&right));
  assert!(both.max_error() >= left.max_error());
  assert!(both.max_error() >= right.max_error());
}

#[test]
fn ranking_equivalent_expressions() {
  let env = Env::from_bounds([("a", ("0.1", "0.2"))]).unwrap();
  let candidates = ["a + a + a + a", "(a + a) + (a + a)", "4 * a"];
  let mut ranked: Vec<_> = candidates.iter()
    .map(|input| (*input, error_eval(&parse_expr(input).unwrap(), &env).unwrap()))
    .collect();
  ranked.sort_by(|(_, x), (_, y)| x.cmp_accuracy(y));
  let order: Vec<_> = ranked.iter().map(|(input, _)| *input).collect();
  assert_eq!(order, vec!["4 * a", "(a + a) + (a + a)", "a + a + a + a"]);
  // Scaling by a constant only adds one rounding step.
  let one_step = &Exact::from(4) * &env.get("a").unwrap().max_error();
  assert_eq!(ranked[0].1.max_error(), &one_step + &Exact::pow2(-54));
}
