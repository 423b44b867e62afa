//! # meetgraph-core
//!
//! A relation-graph and view hydration engine over a normalized, delta-fed record store.
//!
//! ## Overview
//!
//! A remote subscription feed delivers records as flat `(collection, id) → fields` maps.
//! meetgraph-core keeps them in a normalized [`store::Store`] and turns them into linked,
//! typed views: one-to-one, many-to-one and many-to-many relations, polymorphic ("generic")
//! foreign keys that point into a closed set of candidate collections, and per-owner
//! ("structured") relations such as a user's groups in one meeting.
//!
//! ### Key Features
//!
//! - **Symmetric relation declarations**: factories emit both directions of a relation, and
//!   the registry refuses to build if any descriptor lacks its reverse
//! - **Incremental reverse index**: "who points at me" is answered from tables maintained in
//!   the same commit as the records, never by scanning
//! - **Atomic batches**: subscribers get one [`event::CommitNotice`] per batch, after all
//!   record and index updates are in place
//! - **Follow-tree merging**: independently built subscription requests fold into one
//!
//! ## Architecture
//!
//! - **[`store`]**: records, the reverse index and the `apply(batch)` writer path
//! - **[`relation`]**: descriptors, factories, the verified registry and the resolver
//! - **[`hydrate`]**: [`hydrate::Hydrator`] and [`hydrate::ViewModel`]
//! - **[`request`]**: follow trees, their merge, and registry-aware request builders
//! - **[`domain`]**: the meeting application's relation table and typed views
//! - **[`event`]**: the delta wire contract and commit notices
//!
//! ## Quick Start
//!
//! ```rust
//! use meetgraph_core::{
//!     domain::{self, ViewMeeting},
//!     event::DeltaBatch,
//!     hydrate::Hydrator,
//!     GraphConfig,
//! };
//! use serde_json::json;
//!
//! # fn main() -> Result<(), meetgraph_core::GraphError> {
//! let mut store = domain::new_store(&GraphConfig::default())?;
//! store.apply(
//!     DeltaBatch::new()
//!         .update("meeting", 1, json!({"name": "Plenary"}))
//!         .update("motion", 10, json!({"meeting_id": 1, "sort_weight": 5}))
//!         .update("motion", 11, json!({"meeting_id": 1, "sort_weight": 2})),
//! )?;
//!
//! let hydrator = Hydrator::new(&store);
//! let meeting = hydrator.get::<ViewMeeting>(1).expect("meeting/1 is loaded");
//! let order = meeting.motions().iter().map(|m| m.id()).collect::<Vec<_>>();
//! assert_eq!(order, vec![11, 10]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod event;
pub mod hydrate;
pub mod key;
pub mod relation;
pub mod request;
pub mod store;
pub mod value;

pub use config::GraphConfig;
pub use error::*;
