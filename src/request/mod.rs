//! Request module: follow trees, their merging, and registry-aware request construction.
//!
//! - [`follow`]: the [Follow] tree, [FollowEntry] and [Fieldset] wire types
//! - [`merge`]: [merge_follow], the recursive tree union
//! - [`model`]: [ModelRequest], one subscription request
//! - [`builder`]: [ModelRequestBuilder] translating relation names into id fields
//! - [`pool`]: [RequestPool] folding requests before they reach a [SubscriptionSink]

mod builder;
pub mod follow;
pub mod merge;
mod model;
mod pool;

pub use builder::{FollowBuilder, ModelRequestBuilder};
pub use follow::{Fieldset, Follow, FollowEntry, DETAIL, LIST, ROUTING};
pub use merge::merge_follow;
pub use model::ModelRequest;
pub use pool::{RequestPool, SubscriptionSink};
