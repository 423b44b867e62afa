//! Hydrate module: typed, relation-navigable views over normalized records.
//!
//! - [`hydrator`]: [Hydrator] and [ViewModel], plus the [TypedView] seam the domain views
//!   implement
//! - [`cache`]: [RelationCache], relation results memoized per store generation
//! - [`context`]: [ResolveContext], default owners for structured relations

mod cache;
mod context;
mod hydrator;


pub use cache::{CacheKey, RelationCache};
pub use context::ResolveContext;
pub use hydrator::{AsView, Hydrator, TypedView, ViewModel};
