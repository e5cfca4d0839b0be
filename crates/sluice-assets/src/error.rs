use std::sync::Arc;

use thiserror::Error;

use crate::asset_type::AssetType;

/// Errors that can occur while resolving assets.
///
/// Cloneable so that a single failed fetch can be handed to every caller
/// that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
  /// The source has no location configured for this asset type.
  #[error("asset type '{0}' not supported by asset server")]
  Unsupported(AssetType),

  /// The server answered with something other than 200.
  #[error("request to {url} returned non-200 response ({status})")]
  Status { url: String, status: u16 },

  /// The server answered with a non-JSON content type.
  #[error("request to {url} returned non-JSON response")]
  NotJson { url: String },

  /// The request could not be made or its body could not be read.
  #[error(transparent)]
  Transport(Arc<reqwest::Error>),

  /// The payload could not be decoded as the expected asset type.
  #[error("unable to read asset[type={asset_type}, url={url}]: {source}")]
  Decode {
    asset_type: AssetType,
    url: String,
    #[source]
    source: Arc<serde_json::Error>,
  },

  /// A single item was requested that the source doesn't have.
  #[error("no such {asset_type} with uuid '{uuid}'")]
  ItemNotFound { asset_type: AssetType, uuid: String },

  /// The cache held a value of a different asset type for this location.
  #[error("asset cache contains asset with wrong type for {url}")]
  WrongType { url: String },

  /// A source definition could not be read.
  #[error("unable to read asset source: {0}")]
  InvalidSource(String),
}

impl From<reqwest::Error> for AssetError {
  fn from(e: reqwest::Error) -> Self {
    AssetError::Transport(Arc::new(e))
  }
}
