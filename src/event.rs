use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

use crate::{
    key::{Fqid, Id},
    GraphError,
};

/// One record change delivered by the transport.
///
/// On the wire a delta is either `{collection, id, changedFields}` or
/// `{collection, id, deleted: true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireDelta", into = "WireDelta")]
pub enum Delta {
    /// Field-wise last-write-wins update. A `null` field value removes the field. Creates the
    /// record if it is not known yet.
    Update {
        fqid: Fqid,
        changed_fields: JsonMap<String, JsonValue>,
    },
    /// Tombstone.
    Delete { fqid: Fqid },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDelta {
    collection: String,
    id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    changed_fields: Option<JsonMap<String, JsonValue>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    deleted: bool,
}

impl TryFrom<WireDelta> for Delta {
    type Error = GraphError;

    fn try_from(wire: WireDelta) -> Result<Self, Self::Error> {
        let fqid = Fqid::new(wire.collection, wire.id);
        match (wire.deleted, wire.changed_fields) {
            (true, _) => Ok(Delta::Delete { fqid }),
            (false, Some(changed_fields)) => Ok(Delta::Update {
                fqid,
                changed_fields,
            }),
            (false, None) => Err(GraphError::Serialization(format!(
                "delta for {fqid} carries neither `changedFields` nor `deleted: true`"
            ))),
        }
    }
}

impl From<Delta> for WireDelta {
    fn from(delta: Delta) -> Self {
        match delta {
            Delta::Update {
                fqid,
                changed_fields,
            } => WireDelta {
                collection: fqid.collection,
                id: fqid.id,
                changed_fields: Some(changed_fields),
                deleted: false,
            },
            Delta::Delete { fqid } => WireDelta {
                collection: fqid.collection,
                id: fqid.id,
                changed_fields: None,
                deleted: true,
            },
        }
    }
}

impl Delta {
    pub fn fqid(&self) -> &Fqid {
        match self {
            Delta::Update { fqid, .. } => fqid,
            Delta::Delete { fqid } => fqid,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Delta::Delete { .. })
    }
}

impl Display for Delta {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Delta::Update {
                fqid,
                changed_fields,
            } => write!(f, "Update({fqid}, {} fields)", changed_fields.len()),
            Delta::Delete { fqid } => write!(f, "Delete({fqid})"),
        }
    }
}

/// A batch of deltas that the store applies atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeltaBatch(pub Vec<Delta>);

impl DeltaBatch {
    pub fn new() -> DeltaBatch {
        DeltaBatch::default()
    }

    /// Append an update. Non-object `fields` are treated as an empty change set.
    pub fn update(mut self, collection: &str, id: Id, fields: JsonValue) -> DeltaBatch {
        let changed_fields = match fields {
            JsonValue::Object(map) => map,
            other => {
                tracing::warn!("[DeltaBatch::update] ignoring non-object field set {other}");
                JsonMap::new()
            }
        };
        self.0.push(Delta::Update {
            fqid: Fqid::new(collection, id),
            changed_fields,
        });
        self
    }

    pub fn delete(mut self, collection: &str, id: Id) -> DeltaBatch {
        self.0.push(Delta::Delete {
            fqid: Fqid::new(collection, id),
        });
        self
    }

    pub fn push(&mut self, delta: Delta) {
        self.0.push(delta);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delta> {
        self.0.iter()
    }
}

impl FromIterator<Delta> for DeltaBatch {
    fn from_iter<T: IntoIterator<Item = Delta>>(iter: T) -> Self {
        DeltaBatch(iter.into_iter().collect())
    }
}

impl IntoIterator for DeltaBatch {
    type Item = Delta;
    type IntoIter = std::vec::IntoIter<Delta>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Sent to every subscriber once per committed batch, after all record and index updates of
/// that batch are in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitNotice {
    /// Store sequence number reached by this commit.
    pub sequence: u64,
    /// Records created or updated by the batch (and still present after it).
    pub changed: BTreeSet<Fqid>,
    /// Records removed by the batch.
    pub deleted: BTreeSet<Fqid>,
}

impl CommitNotice {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }

    pub fn touches(&self, fqid: &Fqid) -> bool {
        self.changed.contains(fqid) || self.deleted.contains(fqid)
    }

    pub fn touches_collection(&self, collection: &str) -> bool {
        self.changed
            .iter()
            .chain(self.deleted.iter())
            .any(|fqid| fqid.collection == collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shapes_deserialize() {
        let batch: DeltaBatch = serde_json::from_value(json!([
            {"collection": "motion", "id": 5, "changedFields": {"meeting_id": 2}},
            {"collection": "motion", "id": 6, "deleted": true}
        ]))
        .unwrap();

        assert_eq!(batch.len(), 2);
        assert!(matches!(&batch.0[0], Delta::Update { fqid, changed_fields }
            if *fqid == Fqid::new("motion", 5) && changed_fields["meeting_id"] == json!(2)));
        assert_eq!(
            batch.0[1],
            Delta::Delete {
                fqid: Fqid::new("motion", 6)
            }
        );
    }

    #[test]
    fn test_delta_without_payload_is_rejected() {
        let result: Result<Delta, _> =
            serde_json::from_value(json!({"collection": "motion", "id": 5}));
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_serializes_as_tombstone() {
        let value = serde_json::to_value(Delta::Delete {
            fqid: Fqid::new("tag", 3),
        })
        .unwrap();
        assert_eq!(value, json!({"collection": "tag", "id": 3, "deleted": true}));
    }
}
