use serde::Serialize;
use std::collections::BTreeMap;

use crate::{
    key::{Fqid, Id},
    value::Value,
};

/// A normalized record: the decoded fields of one (collection, id).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    fqid: Fqid,
    fields: BTreeMap<String, Value>,
    /// Store sequence of the commit that last touched this record.
    stamp: u64,
}

impl Record {
    pub(crate) fn new(fqid: Fqid, stamp: u64) -> Record {
        Record {
            fqid,
            fields: BTreeMap::new(),
            stamp,
        }
    }

    pub fn fqid(&self) -> &Fqid {
        &self.fqid
    }

    pub fn collection(&self) -> &str {
        &self.fqid.collection
    }

    pub fn id(&self) -> Id {
        self.fqid.id
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub(crate) fn set(&mut self, field: String, value: Value) {
        self.fields.insert(field, value);
    }

    pub(crate) fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub(crate) fn touch(&mut self, stamp: u64) {
        self.stamp = stamp;
    }

    /// Set or clear the value of one owner inside a structured field. The field disappears
    /// once its last owner is cleared.
    pub(crate) fn set_structured(&mut self, field: &str, owner: Id, value: Option<Value>) {
        let mut owners = match self.fields.remove(field) {
            Some(Value::Structured(owners)) => owners,
            _ => BTreeMap::new(),
        };
        match value {
            Some(value) => {
                owners.insert(owner, value);
            }
            None => {
                owners.remove(&owner);
            }
        }
        if !owners.is_empty() {
            self.fields
                .insert(field.to_string(), Value::Structured(owners));
        }
    }
}
