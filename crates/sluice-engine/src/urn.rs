//! Contact URNs: scheme-qualified addresses like `tel:+250788123123`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sluice_assets::ChannelUuid;
use url::form_urlencoded;

use crate::error::UrnError;

pub const TEL_SCHEME: &str = "tel";

const REDACTED: &str = "********";

/// A URN, optionally pinned to the channel it was last used with.
///
/// Serialized as `scheme:path` with the pin carried as a `channel` query
/// parameter, e.g. `tel:+250788123123?channel=57f1078f-...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn {
  pub scheme: String,
  pub path: String,
  pub channel: Option<ChannelUuid>,
}

impl Urn {
  pub fn new(scheme: impl Into<String>, path: impl Into<String>) -> Self {
    Self {
      scheme: scheme.into(),
      path: path.into(),
      channel: None,
    }
  }

  /// This URN pinned to the given channel.
  pub fn with_channel(mut self, channel: impl Into<ChannelUuid>) -> Self {
    self.channel = Some(channel.into());
    self
  }

  /// The URN without its channel pin, which is what identity comparisons use.
  pub fn identity(&self) -> String {
    format!("{}:{}", self.scheme, self.path)
  }

  /// The identity with the path hidden.
  pub fn redacted(&self) -> String {
    format!("{}:{}", self.scheme, REDACTED)
  }
}

impl FromStr for Urn {
  type Err = UrnError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (identity, query) = match s.split_once('?') {
      Some((identity, query)) => (identity, Some(query)),
      None => (s, None),
    };

    let (scheme, path) = identity
      .split_once(':')
      .ok_or_else(|| UrnError(s.to_string()))?;
    if scheme.is_empty() || path.is_empty() || !scheme.chars().all(|c| c.is_ascii_lowercase()) {
      return Err(UrnError(s.to_string()));
    }

    let channel = query.and_then(|q| {
      form_urlencoded::parse(q.as_bytes())
        .find(|(key, _)| key == "channel")
        .map(|(_, value)| value.into_owned())
    });

    Ok(Self {
      scheme: scheme.to_string(),
      path: path.to_string(),
      channel,
    })
  }
}

impl TryFrom<String> for Urn {
  type Error = UrnError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Urn> for String {
  fn from(urn: Urn) -> Self {
    urn.to_string()
  }
}

impl fmt::Display for Urn {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.scheme, self.path)?;
    if let Some(channel) = &self.channel {
      let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("channel", channel)
        .finish();
      write!(f, "?{}", query)?;
    }
    Ok(())
  }
}
