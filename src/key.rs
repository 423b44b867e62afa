//! [crate::key] contains the record identity types: numeric [Id]s and fully-qualified ids
//! ([Fqid]) that name a record across collections.
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::GraphError;

/// Numeric record id, unique within one collection.
pub type Id = u64;

/// Separator between collection and id in the textual FQID form.
pub const KEYSEPARATOR: char = '/';

/// A fully-qualified id: the (collection, id) pair identifying exactly one record.
///
/// Serializes as `"collection/id"`, the composite the transport uses for polymorphic
/// foreign keys.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Fqid {
    pub collection: String,
    pub id: Id,
}

impl Fqid {
    pub fn new(collection: impl Into<String>, id: Id) -> Fqid {
        Fqid {
            collection: collection.into(),
            id,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl Display for Fqid {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}{KEYSEPARATOR}{}", self.collection, self.id)
    }
}

impl FromStr for Fqid {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        split_fqid(s.trim())
            .map(|(collection, id)| Fqid::new(collection, id))
            .ok_or_else(|| GraphError::InvalidFqid(s.to_string()))
    }
}

impl Serialize for Fqid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fqid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Split a textual FQID without allocating a [Fqid]. Returns `None` for anything that is not
/// `collection/id`.
pub fn split_fqid(s: &str) -> Option<(&str, Id)> {
    let (collection, id) = s.split_once(KEYSEPARATOR)?;
    if collection.is_empty() {
        return None;
    }
    Some((collection, id.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_fqid_round_trips_through_text() {
        let fqid: Fqid = "motion/5".parse().unwrap();
        assert_eq!(fqid, Fqid::new("motion", 5));
        assert_eq!(fqid.to_string(), "motion/5");
        assert_eq!(
            serde_json::to_value(&fqid).unwrap(),
            serde_json::json!("motion/5")
        );
    }

    #[test]
    fn test_fqid_rejects_malformed_input() {
        for bad in ["motion", "/5", "motion/", "motion/five", "motion/-1"] {
            assert!(
                matches!(bad.parse::<Fqid>(), Err(GraphError::InvalidFqid(_))),
                "{bad} should not parse"
            );
        }
        assert_eq!(split_fqid("topic/3"), Some(("topic", 3)));
        assert_eq!(split_fqid("topic"), None);
    }
}
