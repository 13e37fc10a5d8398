//! Cache layer that orchestrates network-first reads with offline fallback.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::types::Story;
use crate::api::ApiError;

use super::storage::CacheStorage;
use super::traits::CacheResult;

/// Cache layer that manages the fetch-then-fallback logic.
///
/// The network is always tried first. The cache is only written from a
/// successful feed fetch, and only read when the network call fails.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  /// Fetch the feed, replacing the cached snapshot on success.
  ///
  /// 1. Fetch from network
  /// 2. On success, replace the whole cache with the result and return it
  /// 3. On failure, return the cached snapshot if it has any stories
  /// 4. Otherwise return the network error
  pub async fn fetch_list<F, Fut>(&self, fetcher: F) -> Result<CacheResult<Vec<Story>>, ApiError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Story>, ApiError>>,
  {
    match fetcher().await {
      Ok(stories) => {
        // A failed write must not hide fresh data from the caller
        if let Err(e) = self.storage.replace_all(&stories) {
          warn!("Failed to update story cache: {}", e);
        } else {
          debug!(count = stories.len(), "story cache replaced");
        }
        Ok(CacheResult::from_network(stories))
      }
      Err(err) => self.fallback(err, |_| true),
    }
  }

  /// Fetch a filtered view of the feed without touching the cache.
  ///
  /// On failure the cached stories matching `keep` are served instead.
  pub async fn fetch_filtered<F, Fut, P>(
    &self,
    fetcher: F,
    keep: P,
  ) -> Result<CacheResult<Vec<Story>>, ApiError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Story>, ApiError>>,
    P: Fn(&Story) -> bool,
  {
    match fetcher().await {
      Ok(stories) => Ok(CacheResult::from_network(stories)),
      Err(err) => self.fallback(err, keep),
    }
  }

  /// Fetch a single story, falling back to its cached record.
  pub async fn fetch_one<F, Fut>(
    &self,
    id: &str,
    fetcher: F,
  ) -> Result<CacheResult<Story>, ApiError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Story, ApiError>>,
  {
    match fetcher().await {
      Ok(story) => Ok(CacheResult::from_network(story)),
      Err(err) => match self.storage.get(id) {
        Ok(Some(story)) => {
          debug!(id, "serving cached story after error: {}", err);
          Ok(CacheResult::offline(story, self.cached_at()))
        }
        Ok(None) => Err(err),
        Err(e) => {
          warn!("Failed to read story cache: {}", e);
          Err(err)
        }
      },
    }
  }

  /// Serve whatever the cache holds, or hand back the original error.
  fn fallback<P>(&self, err: ApiError, keep: P) -> Result<CacheResult<Vec<Story>>, ApiError>
  where
    P: Fn(&Story) -> bool,
  {
    let cached = match self.storage.load_all() {
      Ok(stories) => stories,
      Err(e) => {
        // An unreadable cache is an empty cache
        warn!("Failed to read story cache: {}", e);
        Vec::new()
      }
    };

    let stories: Vec<Story> = cached.into_iter().filter(|s| keep(s)).collect();
    if stories.is_empty() {
      return Err(err);
    }

    debug!(count = stories.len(), "serving cached stories after error: {}", err);
    Ok(CacheResult::offline(stories, self.cached_at()))
  }

  fn cached_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
    self.storage.cached_at().unwrap_or_else(|e| {
      warn!("Failed to read cache timestamp: {}", e);
      None
    })
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, SqliteStorage};
  use crate::db::Database;

  fn layer() -> CacheLayer<SqliteStorage> {
    CacheLayer::new(SqliteStorage::new(Arc::new(
      Database::open_in_memory().unwrap(),
    )))
  }

  fn story(id: &str, location: Option<(f64, f64)>) -> Story {
    Story {
      id: id.to_string(),
      name: "Ayu".to_string(),
      description: format!("story {}", id),
      photo_url: String::new(),
      created_at: "2024-03-01T10:00:00.000Z".to_string(),
      lat: location.map(|l| l.0),
      lon: location.map(|l| l.1),
    }
  }

  #[tokio::test]
  async fn test_success_replaces_cache() {
    let layer = layer();
    layer.storage().replace_all(&[story("stale", None)]).unwrap();

    let fresh = vec![story("a", None), story("b", None)];
    let expected = fresh.clone();
    let result = layer.fetch_list(|| async move { Ok(fresh) }).await.unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data, expected);
    assert_eq!(layer.storage().load_all().unwrap(), expected);
  }

  #[tokio::test]
  async fn test_failure_serves_prior_cache() {
    let layer = layer();
    let prior = vec![story("a", None), story("b", None)];
    layer.storage().replace_all(&prior).unwrap();

    let result = layer
      .fetch_list(|| async { Err(ApiError::Network) })
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Offline);
    assert_eq!(result.data, prior);
    assert!(result.cached_at.is_some());
  }

  #[tokio::test]
  async fn test_failure_with_empty_cache_is_an_error() {
    let layer = layer();
    let err = layer
      .fetch_list(|| async { Err(ApiError::Network) })
      .await
      .unwrap_err();
    assert_eq!(err, ApiError::Network);
  }

  #[tokio::test]
  async fn test_unauthorized_still_falls_back() {
    let layer = layer();
    layer.storage().replace_all(&[story("a", None)]).unwrap();

    let result = layer
      .fetch_list(|| async { Err(ApiError::Unauthorized) })
      .await
      .unwrap();
    assert_eq!(result.data.len(), 1);
  }

  #[tokio::test]
  async fn test_filtered_fetch_does_not_write_cache() {
    let layer = layer();
    let prior = vec![story("a", None)];
    layer.storage().replace_all(&prior).unwrap();

    let located = vec![story("m", Some((1.0, 2.0)))];
    let result = layer
      .fetch_filtered(|| async move { Ok(located) }, |s| s.location().is_some())
      .await
      .unwrap();

    assert_eq!(result.data[0].id, "m");
    assert_eq!(layer.storage().load_all().unwrap(), prior);
  }

  #[tokio::test]
  async fn test_filtered_fallback_applies_filter() {
    let layer = layer();
    layer
      .storage()
      .replace_all(&[story("a", None), story("m", Some((1.0, 2.0)))])
      .unwrap();

    let result = layer
      .fetch_filtered(|| async { Err(ApiError::Network) }, |s| s.location().is_some())
      .await
      .unwrap();
    let ids: Vec<&str> = result.data.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["m"]);
  }

  #[tokio::test]
  async fn test_filtered_fallback_with_no_match_is_an_error() {
    let layer = layer();
    layer.storage().replace_all(&[story("a", None)]).unwrap();

    let err = layer
      .fetch_filtered(|| async { Err(ApiError::Network) }, |s| s.location().is_some())
      .await
      .unwrap_err();
    assert_eq!(err, ApiError::Network);
  }

  #[tokio::test]
  async fn test_fetch_one_falls_back_to_cached_record() {
    let layer = layer();
    layer.storage().replace_all(&[story("a", None)]).unwrap();

    let result = layer
      .fetch_one("a", || async { Err(ApiError::Network) })
      .await
      .unwrap();
    assert_eq!(result.source, CacheSource::Offline);
    assert_eq!(result.data.id, "a");

    let err = layer
      .fetch_one("missing", || async { Err(ApiError::Network) })
      .await
      .unwrap_err();
    assert_eq!(err, ApiError::Network);
  }

  #[tokio::test]
  async fn test_fetch_one_does_not_write_cache() {
    let layer = layer();
    let result = layer
      .fetch_one("a", || async { Ok(story("a", None)) })
      .await
      .unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert!(layer.storage().load_all().unwrap().is_empty());
  }
}
