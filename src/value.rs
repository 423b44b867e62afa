//! Field values held by [crate::store::Record]s.
//!
//! Values are decoded once, when a delta is applied. Fields that the relation registry marks
//! as generic foreign keys become [Value::Fqid] (or lists of them) instead of being re-parsed
//! from `"collection/id"` strings on every access, and concrete structured field names
//! (`group_$7_ids`) are folded into a single [Value::Structured] map keyed by owner id.
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::{cmp::Ordering, collections::BTreeMap};

use crate::key::{Fqid, Id};

/// How a raw wire value should be interpreted when it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decoding {
    #[default]
    Plain,
    /// Strings are fully-qualified ids (polymorphic foreign keys).
    Fqid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Fqid(Fqid),
    List(Vec<Value>),
    /// Per-owner values of a structured field, keyed directly by owner id.
    Structured(BTreeMap<Id, Value>),
    Object(JsonMap<String, JsonValue>),
}

impl Value {
    pub fn decode(json: JsonValue, decoding: Decoding) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => match decoding {
                Decoding::Plain => Value::String(s),
                Decoding::Fqid => match s.parse::<Fqid>() {
                    Ok(fqid) => Value::Fqid(fqid),
                    Err(_) => {
                        tracing::warn!(
                            "[Value::decode] '{s}' is not a fully-qualified id, storing it as text"
                        );
                        Value::String(s)
                    }
                },
            },
            JsonValue::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| Value::decode(item, decoding))
                    .collect(),
            ),
            JsonValue::Object(map) => Value::Object(map),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// A single foreign id. Negative numbers are never ids.
    pub fn as_id(&self) -> Option<Id> {
        match self {
            Value::Int(i) => Id::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Foreign ids held by a scalar or list field, in stored order.
    pub fn ids(&self) -> Vec<Id> {
        match self {
            Value::List(items) => items.iter().filter_map(Value::as_id).collect(),
            other => other.as_id().into_iter().collect(),
        }
    }

    pub fn as_fqid(&self) -> Option<&Fqid> {
        match self {
            Value::Fqid(fqid) => Some(fqid),
            _ => None,
        }
    }

    /// Fully-qualified ids held by a scalar or list generic field, in stored order.
    pub fn fqids(&self) -> Vec<&Fqid> {
        match self {
            Value::List(items) => items.iter().filter_map(Value::as_fqid).collect(),
            other => other.as_fqid().into_iter().collect(),
        }
    }

    /// The value stored for `owner` in a structured field.
    pub fn for_owner(&self, owner: Id) -> Option<&Value> {
        match self {
            Value::Structured(map) => map.get(&owner),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Fqid(_) => 4,
            Value::List(_) => 5,
            Value::Structured(_) => 6,
            Value::Object(_) => 7,
        }
    }

    /// Total order used for sorting many-relations by an `order` field.
    ///
    /// Numbers compare numerically (ints and floats mix), strings lexicographically and fqids
    /// by (collection, id). Values of different kinds are ordered by kind.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => self
                .as_f64()
                .unwrap_or_default()
                .total_cmp(&other.as_f64().unwrap_or_default()),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Fqid(a), Value::Fqid(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<Fqid> for Value {
    fn from(fqid: Fqid) -> Value {
        Value::Fqid(fqid)
    }
}

/// Compare two optional order values, placing missing values after present ones.
pub fn cmp_optional(lhs: Option<&Value>, rhs: Option<&Value>) -> Ordering {
    match (lhs, rhs) {
        (Some(a), Some(b)) => a.sort_cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_log::test;

    #[test]
    fn test_decode_generic_fields_into_fqids() {
        let value = Value::decode(json!(["motion/1", "topic/4"]), Decoding::Fqid);
        assert_eq!(
            value.fqids(),
            vec![&Fqid::new("motion", 1), &Fqid::new("topic", 4)]
        );

        // Plain fields keep their text
        let value = Value::decode(json!("motion/1"), Decoding::Plain);
        assert_eq!(value.as_str(), Some("motion/1"));
    }

    #[test]
    fn test_malformed_fqid_is_kept_as_text() {
        let value = Value::decode(json!("not-an-fqid"), Decoding::Fqid);
        assert_eq!(value, Value::String("not-an-fqid".to_string()));
        assert!(value.fqids().is_empty());
    }

    #[test]
    fn test_ids_skip_non_id_items() {
        let value = Value::decode(json!([3, -1, "x", 7]), Decoding::Plain);
        assert_eq!(value.ids(), vec![3, 7]);
        assert_eq!(Value::Int(9).ids(), vec![9]);
        assert!(Value::Null.ids().is_empty());
    }

    #[test]
    fn test_sort_cmp_mixes_ints_and_floats() {
        assert_eq!(Value::Int(2).sort_cmp(&Value::Float(2.5)), Ordering::Less);
        assert_eq!(
            cmp_optional(Some(&Value::Int(10)), None),
            Ordering::Less,
            "missing order values sort last"
        );
    }
}
