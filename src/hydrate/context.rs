use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::key::Id;

/// Named owner ids that structured relations fall back to when resolved without an explicit
/// owner, e.g. `active_meeting_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolveContext(BTreeMap<String, Id>);

impl ResolveContext {
    pub fn new() -> ResolveContext {
        ResolveContext::default()
    }

    pub fn with(mut self, attribute: &str, owner: Id) -> ResolveContext {
        self.set(attribute, owner);
        self
    }

    pub fn set(&mut self, attribute: &str, owner: Id) {
        self.0.insert(attribute.to_string(), owner);
    }

    pub fn clear(&mut self, attribute: &str) -> Option<Id> {
        self.0.remove(attribute)
    }

    pub fn get(&self, attribute: &str) -> Option<Id> {
        self.0.get(attribute).copied()
    }
}
