//! Keyed TTL cache with stale fallback.
//!
//! Each entry stores `(value, expires_at)`. [`TtlCache::get_or_fetch`] serves
//! fresh entries directly, refreshes expired or missing ones, and falls back
//! to an expired entry when the refresh fails.

use std::{
  collections::HashMap,
  future::Future,
  hash::Hash,
  time::Duration,
};

use tokio::{sync::Mutex, time::Instant};

/// Entries kept before the one closest to expiry is evicted.
pub const DEFAULT_CAPACITY: usize = 256;

/// Lifetime used when `now + ttl` is not representable.
const FOREVER: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

struct Entry<V> {
  value:      V,
  expires_at: Instant,
}

/// A value served from [`TtlCache::get_or_fetch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<V> {
  pub value: V,
  /// `true` when the refresh failed and an expired entry was served instead.
  pub stale: bool,
}

pub struct TtlCache<K, V> {
  ttl:      Duration,
  capacity: usize,
  entries:  Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
  K: Eq + Hash + Clone,
  V: Clone,
{
  pub fn new(ttl: Duration) -> Self { Self::with_capacity(ttl, DEFAULT_CAPACITY) }

  pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
    Self {
      ttl,
      capacity: capacity.max(1),
      entries: Mutex::new(HashMap::new()),
    }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  /// The cached value for `key` if it has not expired.
  pub async fn get_fresh(&self, key: &K) -> Option<V> {
    let entries = self.entries.lock().await;
    entries
      .get(key)
      .filter(|e| Instant::now() < e.expires_at)
      .map(|e| e.value.clone())
  }

  /// The cached value for `key`, expired or not.
  pub async fn get_any(&self, key: &K) -> Option<V> {
    self.entries.lock().await.get(key).map(|e| e.value.clone())
  }

  pub async fn insert(&self, key: K, value: V) {
    let mut entries = self.entries.lock().await;
    if entries.len() >= self.capacity && !entries.contains_key(&key) {
      let oldest = entries
        .iter()
        .min_by_key(|(_, e)| e.expires_at)
        .map(|(k, _)| k.clone());
      if let Some(oldest) = oldest {
        entries.remove(&oldest);
      }
    }
    entries.insert(key, Entry { value, expires_at: self.expiry() });
  }

  fn expiry(&self) -> Instant {
    let now = Instant::now();
    now.checked_add(self.ttl).unwrap_or_else(|| now + FOREVER)
  }

  /// Serve `key` from the cache, or run `fetch` and store its result.
  ///
  /// When `fetch` fails and an expired entry exists, that entry is returned
  /// with `stale: true`; otherwise the fetch error is returned.
  ///
  /// The lock is not held while `fetch` runs, so concurrent misses on the same
  /// key may each fetch; the last one to finish wins.
  pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<Cached<V>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
    E: std::fmt::Display,
  {
    if let Some(value) = self.get_fresh(&key).await {
      return Ok(Cached { value, stale: false });
    }

    match fetch().await {
      Ok(value) => {
        self.insert(key, value.clone()).await;
        Ok(Cached { value, stale: false })
      }
      Err(e) => match self.get_any(&key).await {
        Some(value) => {
          tracing::warn!(error = %e, "refresh failed, serving expired cache entry");
          Ok(Cached { value, stale: true })
        }
        None => Err(e),
      },
    }
  }
}
