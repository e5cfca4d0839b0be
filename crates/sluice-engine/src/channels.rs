//! Channel index and outbound channel selection.

use sluice_assets::{Channel, ChannelRole};

use crate::urn::Urn;

/// All the channels available to a session, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ChannelAssets {
  channels: Vec<Channel>,
}

impl ChannelAssets {
  pub fn new(channels: Vec<Channel>) -> Self {
    Self { channels }
  }

  pub fn all(&self) -> &[Channel] {
    &self.channels
  }

  pub fn get(&self, uuid: &str) -> Option<&Channel> {
    self.channels.iter().find(|c| c.uuid == uuid)
  }

  /// Pick the channel to use for `urn` in the given role, or `None` if no
  /// channel can serve it.
  ///
  /// A channel the URN is pinned to wins if it (or a delegate of it) has the
  /// role. Otherwise candidates are the channels supporting the URN's scheme:
  /// a sole candidate is used as is, then the longest explicit match prefix,
  /// then the longest run of leading digits shared between the channel
  /// address and the URN, with ties going to the channel declared last.
  /// Whatever is picked is swapped for a delegate that has the role.
  pub fn resolve(&self, urn: &Urn, role: ChannelRole) -> Option<&Channel> {
    if let Some(pinned) = urn.channel.as_deref().and_then(|uuid| self.get(uuid)) {
      if let Some(delegate) = self.delegate_for(pinned, role) {
        return Some(delegate);
      }
      if pinned.has_role(role) {
        return Some(pinned);
      }
    }

    let candidates: Vec<&Channel> = self
      .channels
      .iter()
      .filter(|c| c.supports_scheme(&urn.scheme))
      .collect();

    let selected = match candidates.as_slice() {
      [] => return None,
      [only] => *only,
      _ => {
        let number = digits(&urn.path);
        best_prefix_match(&candidates, &number).unwrap_or_else(|| best_overlap(&candidates, &number))
      }
    };

    let selected = self.delegate_for(selected, role).unwrap_or(selected);
    selected.has_role(role).then_some(selected)
  }

  /// A channel which delegates for `channel` and has the role.
  fn delegate_for(&self, channel: &Channel, role: ChannelRole) -> Option<&Channel> {
    self.channels.iter().find(|c| {
      c.has_role(role)
        && c
          .parent
          .as_ref()
          .is_some_and(|parent| parent.uuid == channel.uuid)
    })
  }
}

fn digits(s: &str) -> String {
  s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn best_prefix_match<'a>(candidates: &[&'a Channel], number: &str) -> Option<&'a Channel> {
  let mut best: Option<(&'a Channel, usize)> = None;
  for &channel in candidates {
    for prefix in &channel.match_prefixes {
      let prefix = digits(prefix);
      if prefix.is_empty() || !number.starts_with(&prefix) {
        continue;
      }
      if best.is_none_or(|(_, len)| prefix.len() >= len) {
        best = Some((channel, prefix.len()));
      }
    }
  }
  best.map(|(channel, _)| channel)
}

fn best_overlap<'a>(candidates: &[&'a Channel], number: &str) -> &'a Channel {
  let mut best = candidates[0];
  let mut best_len = 0;
  for &channel in candidates {
    let overlap = digits(&channel.address)
      .chars()
      .zip(number.chars())
      .take_while(|(a, b)| a == b)
      .count();
    if overlap >= best_len {
      best = channel;
      best_len = overlap;
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use sluice_assets::ChannelReference;

  use super::*;

  const DEFAULT_ROLES: &[ChannelRole] = &[ChannelRole::Send, ChannelRole::Receive];

  fn channel(
    uuid: &str,
    name: &str,
    address: &str,
    schemes: &[&str],
    roles: &[ChannelRole],
    country: Option<&str>,
  ) -> Channel {
    Channel {
      uuid: uuid.to_string(),
      name: name.to_string(),
      address: address.to_string(),
      schemes: schemes.iter().map(|s| s.to_string()).collect(),
      roles: roles.to_vec(),
      country: country.map(str::to_string),
      match_prefixes: Vec::new(),
      parent: None,
    }
  }

  fn urn(s: &str) -> Urn {
    s.parse().unwrap()
  }

  fn operators() -> ChannelAssets {
    ChannelAssets::new(vec![
      channel("claro", "Claro", "+593971111111", &["tel"], DEFAULT_ROLES, Some("EC")),
      channel("mtn", "MTN", "+250782222222", &["tel"], DEFAULT_ROLES, Some("RW")),
      channel("tigo", "Tigo", "+250723333333", &["tel"], DEFAULT_ROLES, Some("RW")),
      channel("twitter", "Twitter", "nyaruka", &["twitter", "twitterid"], DEFAULT_ROLES, None),
    ])
  }

  fn resolved<'a>(assets: &'a ChannelAssets, u: &str, role: ChannelRole) -> Option<&'a str> {
    assets.resolve(&urn(u), role).map(|c| c.name.as_str())
  }

  #[test]
  fn test_no_channels() {
    let empty = ChannelAssets::default();
    assert_eq!(resolved(&empty, "tel:+12345678999", ChannelRole::Send), None);
    assert_eq!(resolved(&operators(), "mailto:rowan@foo.bar", ChannelRole::Send), None);
  }

  #[test]
  fn test_pinned_channel_wins() {
    let all = operators();
    assert_eq!(
      resolved(&all, "tel:+250962222222?channel=tigo", ChannelRole::Send),
      Some("Tigo")
    );
    // pinned beats a better overlap
    assert_eq!(
      resolved(&all, "tel:+250781234567?channel=claro", ChannelRole::Send),
      Some("Claro")
    );
    // pinned channel without the role falls back to matching
    assert_eq!(
      resolved(&all, "tel:+250781234567?channel=claro", ChannelRole::Call),
      None
    );
  }

  #[test]
  fn test_single_candidate_for_scheme() {
    assert_eq!(
      resolved(&operators(), "twitter:nyaruka2", ChannelRole::Send),
      Some("Twitter")
    );
  }

  #[test]
  fn test_longest_overlap_and_tie_break() {
    let all = operators();
    assert_eq!(resolved(&all, "tel:+593971234567", ChannelRole::Send), Some("Claro"));
    assert_eq!(resolved(&all, "tel:+250781234567", ChannelRole::Send), Some("MTN"));
    assert_eq!(resolved(&all, "tel:+250721234567", ChannelRole::Send), Some("Tigo"));
    assert_eq!(resolved(&all, "tel:+250962222222", ChannelRole::Send), Some("Tigo"));
  }

  #[test]
  fn test_resolution_is_repeatable() {
    let all = operators();
    let urn = urn("tel:+250962222222");
    let first = all.resolve(&urn, ChannelRole::Send).map(|c| c.uuid.clone());
    for _ in 0..10 {
      assert_eq!(all.resolve(&urn, ChannelRole::Send).map(|c| c.uuid.clone()), first);
    }
  }

  #[test]
  fn test_delegates() {
    let android = channel("android", "Android", "+250723333333", &["tel"], DEFAULT_ROLES, None);
    let mut bulk = channel("bulk", "Bulk Sender", "1234", &["tel"], &[ChannelRole::Send], None);
    bulk.parent = Some(ChannelReference::new("android", "Android"));
    let all = ChannelAssets::new(vec![android, bulk]);

    assert_eq!(resolved(&all, "tel:+250721234567", ChannelRole::Receive), Some("Android"));
    assert_eq!(resolved(&all, "tel:+250721234567", ChannelRole::Send), Some("Bulk Sender"));

    // pinned to the parent still goes through the delegate
    assert_eq!(
      resolved(&all, "tel:+250721234567?channel=android", ChannelRole::Send),
      Some("Bulk Sender")
    );
    assert_eq!(
      resolved(&all, "tel:+250721234567?channel=android", ChannelRole::Receive),
      Some("Android")
    );
  }

  #[test]
  fn test_explicit_prefixes() {
    let mut short1 = channel("short1", "Shortcode 1", "1234", &["tel"], &[ChannelRole::Send], Some("RW"));
    short1.match_prefixes = vec!["25078".to_string(), "25077".to_string()];
    let mut short2 = channel("short2", "Shortcode 2", "1235", &["tel"], &[ChannelRole::Send], Some("RW"));
    short2.match_prefixes = vec!["25072".to_string()];
    let all = ChannelAssets::new(vec![short1, short2]);

    assert_eq!(resolved(&all, "tel:+250781234567", ChannelRole::Send), Some("Shortcode 1"));
    assert_eq!(resolved(&all, "tel:+250771234567", ChannelRole::Send), Some("Shortcode 1"));
    assert_eq!(resolved(&all, "tel:+250721234567", ChannelRole::Send), Some("Shortcode 2"));
    assert_eq!(resolved(&all, "tel:+250721234567", ChannelRole::Receive), None);
  }
}
