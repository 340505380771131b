use serde::Serialize;
use thiserror::Error;

/// The canonical encoding of a function name and its arguments, used
/// as the key of memoization and interning tables.
///
/// Arguments are encoded as CBOR. Two argument values with the same
/// serialization produce the same key, so map-typed arguments must be
/// ordered (for instance [`BTreeMap`](std::collections::BTreeMap))
/// for the key to be canonical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(Vec<u8>);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cannot encode arguments to {name} as a cache key: {message}")]
pub struct KeyEncodingError {
  pub name: String,
  pub message: String,
}

impl CacheKey {
  pub fn encode<A>(name: &str, args: &A) -> Result<CacheKey, KeyEncodingError>
  where A: Serialize + ?Sized {
    let mut bytes = Vec::new();
    ciborium::into_writer(&(name, args), &mut bytes).map_err(|err| KeyEncodingError {
      name: name.to_owned(),
      message: err.to_string(),
    })?;
    Ok(CacheKey(bytes))
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }
}
