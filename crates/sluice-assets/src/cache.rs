//! Shared cache of fetched and decoded asset sets.
//!
//! Asset sets are small and scoped to the organization a session belongs to,
//! so decoded values are kept for the lifetime of the cache with no eviction.
//! Each location has at most one fetch in flight: callers arriving while it is
//! pending wait on the same future and observe the same outcome. A failed
//! fetch is not remembered, the next caller starts a new one.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Deserialize;
use sluice_config::FlowDef;
use tokio::sync::Mutex;
use tracing::debug;

use crate::asset_type::AssetType;
use crate::error::AssetError;
use crate::server::AssetFetcher;
use crate::types::{Channel, Classifier, Field, Group, Label, Location, Resthook};

/// A decoded asset payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetSet {
  Channels(Vec<Channel>),
  Classifiers(Vec<Classifier>),
  Fields(Vec<Field>),
  Flow(Box<FlowDef>),
  Groups(Vec<Group>),
  Labels(Vec<Label>),
  Locations(Vec<Location>),
  Resthooks(Vec<Resthook>),
}

#[derive(Deserialize)]
struct ResultsEnvelope<T> {
  results: Vec<T>,
}

impl AssetSet {
  /// Decode a raw payload as the given asset type. Sets are wrapped in a
  /// `{"results": [...]}` envelope, single flows are not.
  pub fn decode(asset_type: AssetType, data: &[u8]) -> Result<Self, serde_json::Error> {
    fn results<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<Vec<T>, serde_json::Error> {
      serde_json::from_slice::<ResultsEnvelope<T>>(data).map(|e| e.results)
    }

    Ok(match asset_type {
      AssetType::Channel => AssetSet::Channels(results(data)?),
      AssetType::Classifier => AssetSet::Classifiers(results(data)?),
      AssetType::Field => AssetSet::Fields(results(data)?),
      AssetType::Flow => AssetSet::Flow(Box::new(serde_json::from_slice(data)?)),
      AssetType::Group => AssetSet::Groups(results(data)?),
      AssetType::Label => AssetSet::Labels(results(data)?),
      AssetType::LocationHierarchy => AssetSet::Locations(results(data)?),
      AssetType::Resthook => AssetSet::Resthooks(results(data)?),
    })
  }
}

type PendingFetch = Shared<BoxFuture<'static, Result<Arc<AssetSet>, AssetError>>>;

enum Entry {
  Ready(Arc<AssetSet>),
  Pending { id: u64, fetch: PendingFetch },
}

#[derive(Default)]
struct Inner {
  entries: HashMap<String, Entry>,
  next_id: u64,
}

/// Caches decoded asset sets by location.
#[derive(Clone, Default)]
pub struct AssetCache {
  inner: Arc<Mutex<Inner>>,
}

impl AssetCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Get the decoded asset at `url`, fetching it with `fetcher` if it isn't
  /// cached and nobody else is already fetching it.
  pub async fn get_or_fetch(
    &self,
    url: &str,
    asset_type: AssetType,
    fetcher: Arc<dyn AssetFetcher>,
  ) -> Result<Arc<AssetSet>, AssetError> {
    let (id, fetch) = {
      let mut inner = self.inner.lock().await;
      match inner.entries.get(url) {
        Some(Entry::Ready(set)) => return Ok(set.clone()),
        Some(Entry::Pending { id, fetch }) => (*id, fetch.clone()),
        None => {
          let id = inner.next_id;
          inner.next_id += 1;
          let fetch = Self::start_fetch(url.to_string(), asset_type, fetcher);
          inner.entries.insert(
            url.to_string(),
            Entry::Pending {
              id,
              fetch: fetch.clone(),
            },
          );
          (id, fetch)
        }
      }
    };

    let result = fetch.await;

    // Whoever finishes first settles the entry, as long as it's still ours.
    let mut inner = self.inner.lock().await;
    let still_ours = matches!(
      inner.entries.get(url),
      Some(Entry::Pending { id: pending_id, .. }) if *pending_id == id
    );
    if still_ours {
      match &result {
        Ok(set) => {
          inner
            .entries
            .insert(url.to_string(), Entry::Ready(set.clone()));
        }
        Err(_) => {
          inner.entries.remove(url);
        }
      }
    }

    result
  }

  /// Number of locations with a decoded value.
  pub async fn len(&self) -> usize {
    let inner = self.inner.lock().await;
    inner
      .entries
      .values()
      .filter(|e| matches!(e, Entry::Ready(_)))
      .count()
  }

  pub async fn is_empty(&self) -> bool {
    self.len().await == 0
  }

  /// Clear the cache.
  pub async fn clear(&self) {
    self.inner.lock().await.entries.clear();
  }

  fn start_fetch(url: String, asset_type: AssetType, fetcher: Arc<dyn AssetFetcher>) -> PendingFetch {
    async move {
      debug!(asset_type = %asset_type, url = %url, "asset fetch started");
      let data = fetcher.fetch(&url, asset_type).await?;
      let set = AssetSet::decode(asset_type, &data).map_err(|e| AssetError::Decode {
        asset_type,
        url: url.clone(),
        source: Arc::new(e),
      })?;
      Ok(Arc::new(set))
    }
    .boxed()
    .shared()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  use async_trait::async_trait;

  use super::*;

  /// Fetcher that counts calls and answers slowly.
  struct CountingFetcher {
    calls: AtomicUsize,
    body: Option<&'static str>,
  }

  #[async_trait]
  impl AssetFetcher for CountingFetcher {
    async fn fetch(&self, url: &str, _asset_type: AssetType) -> Result<Vec<u8>, AssetError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      tokio::time::sleep(Duration::from_millis(50)).await;
      match self.body {
        Some(body) => Ok(body.as_bytes().to_vec()),
        None => Err(AssetError::Status {
          url: url.to_string(),
          status: 503,
        }),
      }
    }
  }

  #[test]
  fn test_decode_set_and_flow() {
    let set = AssetSet::decode(
      AssetType::Group,
      br#"{"results": [{"uuid": "g1", "name": "Testers"}]}"#,
    )
    .unwrap();
    assert!(matches!(set, AssetSet::Groups(ref groups) if groups[0].name == "Testers"));

    let flow = AssetSet::decode(AssetType::Flow, br#"{"uuid": "f1", "name": "Flow"}"#).unwrap();
    assert!(matches!(flow, AssetSet::Flow(ref f) if f.uuid == "f1"));

    assert!(AssetSet::decode(AssetType::Label, br#"{"items": []}"#).is_err());
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_concurrent_requests_share_one_fetch() {
    let cache = AssetCache::new();
    let fetcher = Arc::new(CountingFetcher {
      calls: AtomicUsize::new(0),
      body: Some(r#"{"results": [{"uuid": "g1", "name": "Testers"}]}"#),
    });

    let handles: Vec<_> = (0..10)
      .map(|_| {
        let cache = cache.clone();
        let fetcher: Arc<dyn AssetFetcher> = fetcher.clone();
        tokio::spawn(async move {
          cache
            .get_or_fetch("http://assets/group/", AssetType::Group, fetcher)
            .await
        })
      })
      .collect();

    let results = futures::future::join_all(handles).await;
    let first = results[0].as_ref().unwrap().as_ref().unwrap().clone();
    for result in results {
      let set = result.unwrap().unwrap();
      assert!(Arc::ptr_eq(&set, &first));
    }

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len().await, 1);

    // a later request is served from the cache
    let fetcher_dyn: Arc<dyn AssetFetcher> = fetcher.clone();
    cache
      .get_or_fetch("http://assets/group/", AssetType::Group, fetcher_dyn)
      .await
      .unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_concurrent_requests_share_failure() {
    let cache = AssetCache::new();
    let fetcher = Arc::new(CountingFetcher {
      calls: AtomicUsize::new(0),
      body: None,
    });

    let handles: Vec<_> = (0..5)
      .map(|_| {
        let cache = cache.clone();
        let fetcher: Arc<dyn AssetFetcher> = fetcher.clone();
        tokio::spawn(async move {
          cache
            .get_or_fetch("http://assets/label/", AssetType::Label, fetcher)
            .await
        })
      })
      .collect();

    for result in futures::future::join_all(handles).await {
      let err = result.unwrap().unwrap_err();
      assert_eq!(
        err.to_string(),
        "request to http://assets/label/ returned non-200 response (503)"
      );
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert!(cache.is_empty().await);

    // failures aren't remembered
    let fetcher_dyn: Arc<dyn AssetFetcher> = fetcher.clone();
    let _ = cache
      .get_or_fetch("http://assets/label/", AssetType::Label, fetcher_dyn)
      .await;
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_distinct_locations_fetch_separately() {
    let cache = AssetCache::new();
    let fetcher = Arc::new(CountingFetcher {
      calls: AtomicUsize::new(0),
      body: Some(r#"{"results": []}"#),
    });

    let a: Arc<dyn AssetFetcher> = fetcher.clone();
    let b: Arc<dyn AssetFetcher> = fetcher.clone();
    let (ra, rb) = tokio::join!(
      cache.get_or_fetch("http://assets/label/", AssetType::Label, a),
      cache.get_or_fetch("http://assets/group/", AssetType::Group, b),
    );
    assert!(ra.is_ok() && rb.is_ok());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len().await, 2);
  }
}
