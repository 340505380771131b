//! Interning of immutable values.
//!
//! Values constructed through [`Interned::new`] with identical
//! arguments share one allocation for as long as any handle to it is
//! alive. The table only holds weak references, so it never keeps a
//! value alive by itself. Dead entries are dropped by
//! [`sweep_interned`], and the table sweeps itself whenever it has
//! doubled in size since its last sweep.

use super::key::{CacheKey, KeyEncodingError};

use serde::{Serialize, Serializer};
use tracing::debug;

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// The table is not swept automatically below this many entries.
const MIN_SWEEP_THRESHOLD: usize = 64;

thread_local! {
  static TABLE: RefCell<InternTable> = RefCell::new(InternTable::new());
}

struct InternTable {
  entries: HashMap<(TypeId, CacheKey), Weak<dyn Any>>,
  sweep_threshold: usize,
}

/// A shared handle to an immutable value.
pub struct Interned<T>(Rc<T>);

impl InternTable {
  fn new() -> Self {
    InternTable { entries: HashMap::new(), sweep_threshold: MIN_SWEEP_THRESHOLD }
  }

  fn lookup<T: 'static>(&self, key: &(TypeId, CacheKey)) -> Option<Rc<T>> {
    let live = self.entries.get(key)?.upgrade()?;
    live.downcast::<T>().ok()
  }

  fn register<T: 'static>(&mut self, key: (TypeId, CacheKey), value: &Rc<T>) {
    let erased: Rc<dyn Any> = value.clone();
    self.entries.insert(key, Rc::downgrade(&erased));
    if self.entries.len() >= self.sweep_threshold {
      self.sweep();
    }
  }

  fn sweep(&mut self) -> usize {
    let before = self.entries.len();
    self.entries.retain(|_, weak| weak.strong_count() > 0);
    self.sweep_threshold = (2 * self.entries.len()).max(MIN_SWEEP_THRESHOLD);
    let removed = before - self.entries.len();
    debug!(removed, remaining = self.entries.len(), "Swept interning table");
    removed
  }
}

impl<T: 'static> Interned<T> {
  /// Returns the live value previously constructed from `args`, or
  /// constructs one with `construct(args)` and registers it.
  ///
  /// `construct` must be a pure function of `args`: any value it
  /// returns for the same arguments is interchangeable with any other.
  pub fn new<A, F>(args: A, construct: F) -> Result<Interned<T>, KeyEncodingError>
  where A: Serialize,
        F: FnOnce(A) -> T {
    let key = (TypeId::of::<T>(), CacheKey::encode(type_name::<T>(), &args)?);
    if let Some(existing) = TABLE.with(|table| table.borrow().lookup::<T>(&key)) {
      return Ok(Interned(existing));
    }
    // The table is not borrowed during construction, which may intern
    // other values.
    let value = Rc::new(construct(args));
    TABLE.with(|table| {
      let mut table = table.borrow_mut();
      match table.lookup::<T>(&key) {
        Some(existing) => Ok(Interned(existing)),
        None => {
          table.register(key, &value);
          Ok(Interned(value))
        }
      }
    })
  }

  /// A handle which is never shared with any other construction.
  pub fn fresh(value: T) -> Interned<T> {
    Interned(Rc::new(value))
  }
}

impl<T> Interned<T> {
  /// Whether the two handles refer to the same instance.
  pub fn ptr_eq(this: &Interned<T>, other: &Interned<T>) -> bool {
    Rc::ptr_eq(&this.0, &other.0)
  }

  pub fn strong_count(this: &Interned<T>) -> usize {
    Rc::strong_count(&this.0)
  }
}

/// Drops the entries of values which are no longer alive. Returns the
/// number of entries removed.
pub fn sweep_interned() -> usize {
  TABLE.with(|table| table.borrow_mut().sweep())
}

/// The number of entries in this thread's table, including any dead
/// entries not yet swept.
pub fn interned_len() -> usize {
  TABLE.with(|table| table.borrow().entries.len())
}

/// Forgets every entry. Values which are still alive remain valid,
/// but are no longer shared with later constructions.
pub fn clear_interned() {
  TABLE.with(|table| {
    let mut table = table.borrow_mut();
    table.entries.clear();
    table.sweep_threshold = MIN_SWEEP_THRESHOLD;
  })
}

impl<T> Clone for Interned<T> {
  fn clone(&self) -> Self {
    Interned(Rc::clone(&self.0))
  }
}

impl<T> Deref for Interned<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<T> AsRef<T> for Interned<T> {
  fn as_ref(&self) -> &T {
    &self.0
  }
}

impl<T: PartialEq> PartialEq for Interned<T> {
  fn eq(&self, other: &Interned<T>) -> bool {
    Interned::ptr_eq(self, other) || *self.0 == *other.0
  }
}

impl<T: Eq> Eq for Interned<T> {}

impl<T: Hash> Hash for Interned<T> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.0.hash(state)
  }
}

impl<T: Debug> Debug for Interned<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    Debug::fmt(&*self.0, f)
  }
}

impl<T: Display> Display for Interned<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    Display::fmt(&*self.0, f)
  }
}

/// Serializes the value itself. Identity is not preserved.
impl<T: Serialize> Serialize for Interned<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    (*self.0).serialize(serializer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memo::key::tests::Unencodable;

  #[derive(Debug, PartialEq, Eq, Hash)]
  struct Point {
    x: i32,
    y: i32,
  }

  fn point(x: i32, y: i32) -> Interned<Point> {
    Interned::new((x, y), |(x, y)| Point { x, y }).unwrap()
  }

  #[test]
  fn test_identical_arguments_share_instance() {
    let a = point(1, 2);
    let b = point(1, 2);
    assert!(Interned::ptr_eq(&a, &b));
    assert_eq!(Interned::strong_count(&a), 2);
  }

  #[test]
  fn test_distinct_arguments_distinct_instances() {
    let a = point(1, 2);
    let b = point(2, 1);
    assert!(!Interned::ptr_eq(&a, &b));
    assert_ne!(a, b);
  }

  #[test]
  fn test_fresh_is_never_shared() {
    let a = Interned::fresh(Point { x: 0, y: 0 });
    let b = point(0, 0);
    let c = Interned::fresh(Point { x: 0, y: 0 });
    assert!(!Interned::ptr_eq(&a, &b));
    assert!(!Interned::ptr_eq(&a, &c));
    // Still equal by value.
    assert_eq!(a, b);
  }

  #[test]
  fn test_dropped_values_are_swept() {
    sweep_interned();
    let before = interned_len();
    let a = point(7, 7);
    assert_eq!(interned_len(), before + 1);
    drop(a);
    assert!(sweep_interned() >= 1);
    assert_eq!(interned_len(), before);
    // A new construction allocates again and is registered again.
    let b = point(7, 7);
    assert_eq!(Interned::strong_count(&b), 1);
  }

  #[test]
  fn test_table_sweeps_itself() {
    for i in 0..(4 * MIN_SWEEP_THRESHOLD as i32) {
      let _ = point(i, -i);
    }
    assert!(interned_len() <= MIN_SWEEP_THRESHOLD);
  }

  #[test]
  fn test_types_do_not_collide() {
    let a: Interned<i64> = Interned::new(5i32, i64::from).unwrap();
    let b: Interned<i32> = Interned::new(5i32, |x| x).unwrap();
    assert_eq!(*a, 5);
    assert_eq!(*b, 5);
  }

  #[test]
  fn test_clear_interned_unshares() {
    let a = point(3, 4);
    clear_interned();
    let b = point(3, 4);
    assert!(!Interned::ptr_eq(&a, &b));
    assert_eq!(a, b);
  }

  #[test]
  fn test_encoding_failure() {
    let result = Interned::new(Unencodable, |_| 0u8);
    assert!(result.is_err());
  }

  #[test]
  fn test_serialize_inner_value() {
    let a: Interned<String> = Interned::new("abc", String::from).unwrap();
    assert_eq!(serde_json::to_string(&a).unwrap(), "\"abc\"");
  }
}
