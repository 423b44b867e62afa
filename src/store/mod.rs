//! Store module: the normalized record store and its reverse index.
//!
//! # Module Organization
//!
//! - [`record`]: [Record], the decoded fields of one (collection, id)
//! - [`index`]: [ReverseIndex], "who points at me" tables per relation id field
//! - [`base`]: [Store] with the `apply(batch)` writer path, and [SharedStore]
//!
//! ```rust
//! use meetgraph_core::{event::DeltaBatch, key::Fqid, relation::{make_m2o, Registry, M2O}, store::Store};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = Registry::builder()
//!     .add(make_m2o(M2O {
//!         one: "meeting",
//!         many: "motion",
//!         one_field: "motions",
//!         many_field: "meeting",
//!         ..Default::default()
//!     }))
//!     .build()
//!     .unwrap();
//! let mut store = Store::new(Arc::new(registry));
//! store
//!     .apply(DeltaBatch::new().update("motion", 5, json!({"meeting_id": 2})))
//!     .unwrap();
//! let referrers = store.referrers("motion", "meeting_id", &Fqid::new("meeting", 2), None);
//! assert!(referrers.contains(&5));
//! ```

mod base;
pub mod index;
mod record;


pub use base::{Generation, SharedStore, Store};
pub use index::ReverseIndex;
pub use record::Record;
