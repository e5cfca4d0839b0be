//! Asset source backed by an asset server.
//!
//! Each asset type has a base URL. Sets are fetched from the base URL itself,
//! single items from `{base}{uuid}/`. Requests carry a token authorization
//! header, and only `200` responses with a JSON content type are accepted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use sluice_config::FlowDef;
use tracing::debug;

use crate::asset_type::AssetType;
use crate::cache::{AssetCache, AssetSet};
use crate::error::AssetError;
use crate::source::AssetSource;
use crate::types::{Channel, Classifier, Field, Group, Label, Location, Resthook};

/// Performs the raw fetch of an asset location.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
  async fn fetch(&self, url: &str, asset_type: AssetType) -> Result<Vec<u8>, AssetError>;
}

/// Fetches assets over HTTP.
///
/// Timeouts are the caller's concern: configure them on the `Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client: Client,
  auth_token: String,
}

impl HttpFetcher {
  pub fn new(client: Client, auth_token: impl Into<String>) -> Self {
    Self {
      client,
      auth_token: auth_token.into(),
    }
  }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
  async fn fetch(&self, url: &str, asset_type: AssetType) -> Result<Vec<u8>, AssetError> {
    let response = self
      .client
      .get(url)
      .header(AUTHORIZATION, format!("Token {}", self.auth_token))
      .send()
      .await?;

    debug!(asset_type = %asset_type, url = %url, "asset requested");

    let status = response.status().as_u16();
    if status != 200 {
      return Err(AssetError::Status {
        url: url.to_string(),
        status,
      });
    }

    if !is_json(response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok())) {
      return Err(AssetError::NotJson {
        url: url.to_string(),
      });
    }

    Ok(response.bytes().await?.to_vec())
  }
}

/// Whether a content type header names JSON, ignoring parameters like charset.
fn is_json(content_type: Option<&str>) -> bool {
  content_type
    .and_then(|ct| ct.split(';').next())
    .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

/// Deterministic fetcher for tests: records every URL it is asked for and
/// answers with a configured body, or an empty result set.
#[derive(Debug, Default)]
pub struct MockFetcher {
  responses: Mutex<HashMap<String, Vec<u8>>>,
  requests: Mutex<Vec<String>>,
}

impl MockFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Configure the body returned for `url`.
  pub fn mock_response(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
    self
      .responses
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(url.into(), body.into());
  }

  /// Every URL requested so far, in order.
  pub fn requests(&self) -> Vec<String> {
    self
      .requests
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}

#[async_trait]
impl AssetFetcher for MockFetcher {
  async fn fetch(&self, url: &str, _asset_type: AssetType) -> Result<Vec<u8>, AssetError> {
    self
      .requests
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(url.to_string());

    let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(
      responses
        .get(url)
        .cloned()
        .unwrap_or_else(|| br#"{"results":[]}"#.to_vec()),
    )
  }
}

#[derive(Debug, Serialize, Deserialize)]
struct ServerSourceEnvelope {
  type_urls: HashMap<AssetType, String>,
}

/// An asset source which fetches assets from a server and caches them.
#[derive(Clone)]
pub struct ServerSource {
  type_urls: HashMap<AssetType, String>,
  fetcher: Arc<dyn AssetFetcher>,
  cache: AssetCache,
}

impl ServerSource {
  /// Create a source that fetches over HTTP with the given token.
  pub fn new(
    auth_token: impl Into<String>,
    type_urls: HashMap<AssetType, String>,
    client: Client,
    cache: AssetCache,
  ) -> Self {
    Self::with_fetcher(type_urls, Arc::new(HttpFetcher::new(client, auth_token)), cache)
  }

  /// Create a source with a custom fetcher, e.g. a [`MockFetcher`].
  pub fn with_fetcher(
    type_urls: HashMap<AssetType, String>,
    fetcher: Arc<dyn AssetFetcher>,
    cache: AssetCache,
  ) -> Self {
    Self {
      type_urls,
      fetcher,
      cache,
    }
  }

  /// Read a source from a `{"type_urls": {...}}` document.
  pub fn from_json(
    auth_token: impl Into<String>,
    client: Client,
    cache: AssetCache,
    data: &[u8],
  ) -> Result<Self, AssetError> {
    let envelope: ServerSourceEnvelope =
      serde_json::from_slice(data).map_err(|e| AssetError::InvalidSource(e.to_string()))?;
    Ok(Self::new(auth_token, envelope.type_urls, client, cache))
  }

  /// Serialize this source's configuration back to its JSON form.
  pub fn to_json(&self) -> serde_json::Value {
    serde_json::json!({ "type_urls": self.type_urls })
  }

  pub fn type_urls(&self) -> &HashMap<AssetType, String> {
    &self.type_urls
  }

  /// The location of a set, or of a single item when `uuid` is given.
  pub fn asset_url(&self, asset_type: AssetType, uuid: Option<&str>) -> Result<String, AssetError> {
    let base = self
      .type_urls
      .get(&asset_type)
      .ok_or(AssetError::Unsupported(asset_type))?;

    Ok(match uuid {
      Some(uuid) => format!("{}{}/", base, uuid),
      None => base.clone(),
    })
  }

  /// Get a decoded asset through the cache.
  pub async fn get_asset(
    &self,
    asset_type: AssetType,
    uuid: Option<&str>,
  ) -> Result<Arc<AssetSet>, AssetError> {
    let url = self.asset_url(asset_type, uuid)?;
    self
      .cache
      .get_or_fetch(&url, asset_type, self.fetcher.clone())
      .await
  }

  async fn get_set<T: Clone>(
    &self,
    asset_type: AssetType,
    extract: fn(&AssetSet) -> Option<&Vec<T>>,
  ) -> Result<Vec<T>, AssetError> {
    let set = self.get_asset(asset_type, None).await?;
    extract(&set).cloned().ok_or_else(|| AssetError::WrongType {
      url: self.asset_url(asset_type, None).unwrap_or_default(),
    })
  }
}

#[async_trait]
impl AssetSource for ServerSource {
  async fn channels(&self) -> Result<Vec<Channel>, AssetError> {
    self
      .get_set(AssetType::Channel, |s| match s {
        AssetSet::Channels(v) => Some(v),
        _ => None,
      })
      .await
  }

  async fn classifiers(&self) -> Result<Vec<Classifier>, AssetError> {
    // classifiers are optional on older servers
    if !self.type_urls.contains_key(&AssetType::Classifier) {
      return Ok(Vec::new());
    }
    self
      .get_set(AssetType::Classifier, |s| match s {
        AssetSet::Classifiers(v) => Some(v),
        _ => None,
      })
      .await
  }

  async fn fields(&self) -> Result<Vec<Field>, AssetError> {
    self
      .get_set(AssetType::Field, |s| match s {
        AssetSet::Fields(v) => Some(v),
        _ => None,
      })
      .await
  }

  async fn groups(&self) -> Result<Vec<Group>, AssetError> {
    self
      .get_set(AssetType::Group, |s| match s {
        AssetSet::Groups(v) => Some(v),
        _ => None,
      })
      .await
  }

  async fn labels(&self) -> Result<Vec<Label>, AssetError> {
    self
      .get_set(AssetType::Label, |s| match s {
        AssetSet::Labels(v) => Some(v),
        _ => None,
      })
      .await
  }

  async fn locations(&self) -> Result<Vec<Location>, AssetError> {
    if !self.has_locations() {
      return Ok(Vec::new());
    }
    self
      .get_set(AssetType::LocationHierarchy, |s| match s {
        AssetSet::Locations(v) => Some(v),
        _ => None,
      })
      .await
  }

  async fn resthooks(&self) -> Result<Vec<Resthook>, AssetError> {
    self
      .get_set(AssetType::Resthook, |s| match s {
        AssetSet::Resthooks(v) => Some(v),
        _ => None,
      })
      .await
  }

  async fn flow(&self, uuid: &str) -> Result<FlowDef, AssetError> {
    let set = self.get_asset(AssetType::Flow, Some(uuid)).await?;
    match set.as_ref() {
      AssetSet::Flow(flow) => Ok(flow.as_ref().clone()),
      _ => Err(AssetError::WrongType {
        url: self.asset_url(AssetType::Flow, Some(uuid))?,
      }),
    }
  }

  fn has_locations(&self) -> bool {
    self.type_urls.contains_key(&AssetType::LocationHierarchy)
  }
}

#[cfg(test)]
mod tests {
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;
  use tokio::task::JoinHandle;

  use super::*;

  fn type_urls() -> HashMap<AssetType, String> {
    HashMap::from([
      (AssetType::Channel, "http://testserver/assets/channel/".to_string()),
      (AssetType::Field, "http://testserver/assets/field/".to_string()),
      (AssetType::Flow, "http://testserver/assets/flow/".to_string()),
      (AssetType::Group, "http://testserver/assets/group/".to_string()),
      (AssetType::Label, "http://testserver/assets/label/".to_string()),
      (AssetType::Resthook, "http://testserver/assets/resthook/".to_string()),
    ])
  }

  #[test]
  fn test_asset_url() {
    let source = ServerSource::with_fetcher(type_urls(), Arc::new(MockFetcher::new()), AssetCache::new());

    assert_eq!(
      source.asset_url(AssetType::Group, None).unwrap(),
      "http://testserver/assets/group/"
    );
    assert_eq!(
      source.asset_url(AssetType::Flow, Some("f1")).unwrap(),
      "http://testserver/assets/flow/f1/"
    );
    assert_eq!(
      source
        .asset_url(AssetType::Classifier, None)
        .unwrap_err()
        .to_string(),
      "asset type 'classifier' not supported by asset server"
    );
  }

  #[test]
  fn test_is_json() {
    assert!(is_json(Some("application/json")));
    assert!(is_json(Some("application/json; charset=utf-8")));
    assert!(!is_json(Some("text/html")));
    assert!(!is_json(None));
  }

  #[test]
  fn test_from_json() {
    let source = ServerSource::from_json(
      "sesame",
      Client::new(),
      AssetCache::new(),
      br#"{"type_urls": {"group": "http://testserver/assets/group/"}}"#,
    )
    .unwrap();
    assert_eq!(source.type_urls().len(), 1);
    assert_eq!(
      source.to_json(),
      serde_json::json!({"type_urls": {"group": "http://testserver/assets/group/"}})
    );

    assert!(ServerSource::from_json("sesame", Client::new(), AssetCache::new(), b"[]").is_err());
  }

  #[tokio::test]
  async fn test_mock_records_requests_and_uses_cache() {
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.mock_response(
      "http://testserver/assets/group/",
      r#"{"results": [{"uuid": "2aad21f6-30b7-42c5-bd7f-1b720c154817", "name": "Survey Audience"}]}"#,
    );
    let source = ServerSource::with_fetcher(type_urls(), fetcher.clone(), AssetCache::new());

    let groups = source.groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "Survey Audience");

    // unmocked sets come back empty
    assert!(source.labels().await.unwrap().is_empty());

    // second call hits the cache
    source.groups().await.unwrap();

    // unsupported optional types don't make requests
    assert!(source.locations().await.unwrap().is_empty());
    assert!(source.classifiers().await.unwrap().is_empty());
    assert!(!source.has_locations());

    assert_eq!(
      fetcher.requests(),
      vec![
        "http://testserver/assets/group/".to_string(),
        "http://testserver/assets/label/".to_string(),
      ]
    );
  }

  #[tokio::test]
  async fn test_flow_fetch_decode_error() {
    let fetcher = Arc::new(MockFetcher::new());
    let source = ServerSource::with_fetcher(type_urls(), fetcher.clone(), AssetCache::new());

    // the default empty set isn't a flow
    let err = source.flow("f1").await.unwrap_err();
    assert!(matches!(err, AssetError::Decode { asset_type: AssetType::Flow, .. }));
    assert_eq!(fetcher.requests(), vec!["http://testserver/assets/flow/f1/".to_string()]);
  }

  /// Serve a single HTTP response on a local port. The handle yields the raw
  /// request head that was received.
  async fn serve_once(
    status: &'static str,
    content_type: &'static str,
    body: &'static str,
  ) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/assets/", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut head = Vec::new();
      let mut buf = [0u8; 1024];
      while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
          break;
        }
        head.extend_from_slice(&buf[..n]);
      }

      let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      socket.shutdown().await.unwrap();
      String::from_utf8_lossy(&head).into_owned()
    });

    (base, handle)
  }

  fn http_fetcher() -> HttpFetcher {
    HttpFetcher::new(Client::builder().no_proxy().build().unwrap(), "sesame")
  }

  #[tokio::test]
  async fn test_http_fetcher_rejects_error_status() {
    let (base, server) = serve_once("503 Service Unavailable", "application/json", "{}").await;
    let url = format!("{}group/", base);

    let err = http_fetcher().fetch(&url, AssetType::Group).await.unwrap_err();
    assert!(matches!(err, AssetError::Status { status: 503, .. }));
    assert_eq!(
      err.to_string(),
      format!("request to {} returned non-200 response (503)", url)
    );
    server.await.unwrap();
  }

  #[tokio::test]
  async fn test_http_fetcher_rejects_non_json() {
    let (base, server) = serve_once("200 OK", "text/html", "<html></html>").await;
    let url = format!("{}group/", base);

    let err = http_fetcher().fetch(&url, AssetType::Group).await.unwrap_err();
    assert!(matches!(err, AssetError::NotJson { .. }));
    server.await.unwrap();
  }

  #[tokio::test]
  async fn test_server_source_over_http() {
    let (base, server) = serve_once(
      "200 OK",
      "application/json; charset=utf-8",
      r#"{"results": [{"uuid": "2aad21f6-30b7-42c5-bd7f-1b720c154817", "name": "Survey Audience"}]}"#,
    )
    .await;

    let source = ServerSource::new(
      "sesame",
      HashMap::from([(AssetType::Group, format!("{}group/", base))]),
      Client::builder().no_proxy().build().unwrap(),
      AssetCache::new(),
    );
    let groups = source.groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "Survey Audience");

    let request = server.await.unwrap().to_lowercase();
    assert!(request.starts_with("get /assets/group/ http/1.1"));
    assert!(request.contains("authorization: token sesame\r\n"));
  }
}
