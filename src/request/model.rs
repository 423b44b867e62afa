use serde::{Deserialize, Serialize};

use crate::{
    key::Id,
    request::{
        follow::{Fieldset, Follow, FollowEntry},
        merge::merge_follow,
    },
    GraphError,
};

/// A subscription request: records of one collection, and the follow tree to hydrate around
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    pub collection: String,
    pub ids: Vec<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fieldset: Option<Fieldset>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow: Vec<FollowEntry>,
}

impl ModelRequest {
    pub fn new(collection: &str, ids: impl IntoIterator<Item = Id>) -> ModelRequest {
        ModelRequest {
            collection: collection.to_string(),
            ids: ids.into_iter().collect(),
            fieldset: None,
            follow: Vec::new(),
        }
    }

    /// The request viewed as a follow tree rooted at its collection.
    pub fn root(&self) -> Follow {
        Follow {
            id_field: self.collection.clone(),
            follow: self.follow.clone(),
            fieldset: self.fieldset.clone(),
        }
    }

    /// Combine two requests for the same collection: ids are unioned in first-seen order and
    /// the follow trees merged with [merge_follow].
    pub fn merge(&self, other: &ModelRequest) -> Result<ModelRequest, GraphError> {
        if self.collection != other.collection {
            return Err(GraphError::RequestMismatch(format!(
                "cannot merge a `{}` request with a `{}` request",
                self.collection, other.collection
            )));
        }
        let root = merge_follow(&self.root(), &other.root())?;
        let mut ids = self.ids.clone();
        for id in other.ids.iter() {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        Ok(ModelRequest {
            collection: self.collection.clone(),
            ids,
            fieldset: root.fieldset,
            follow: root.follow,
        })
    }
}
