//! Sluice Assets
//!
//! Assets are the organization-level definitions a flow runs against:
//! channels, classifiers, fields, groups, labels, locations, resthooks and
//! the flows themselves.
//!
//! The [`AssetSource`] trait is what the engine consumes. Two sources are
//! provided:
//! - [`ServerSource`] fetches assets over HTTP (or through a [`MockFetcher`]
//!   in tests) and shares decoded results through an [`AssetCache`]
//! - [`StaticSource`] serves assets from a single in-memory document

mod asset_type;
mod cache;
mod error;
mod reference;
mod server;
mod source;
mod static_source;
mod types;

pub use asset_type::AssetType;
pub use cache::{AssetCache, AssetSet};
pub use error::AssetError;
pub use reference::{
  AssetReference, ChannelReference, ClassifierReference, FieldReference, FlowReference,
  GroupReference, LabelReference,
};
pub use server::{AssetFetcher, HttpFetcher, MockFetcher, ServerSource};
pub use source::AssetSource;
pub use static_source::StaticSource;
pub use types::{
  Channel, ChannelRole, ChannelUuid, Classifier, ClassifierUuid, Field, FieldType, Group,
  GroupUuid, Label, LabelUuid, Location, Resthook,
};
