//! Secondary reverse index: for every relation id field, which records point at which target.
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    key::{Fqid, Id},
    relation::{Foreign, RelationDescriptor},
    value::Value,
};

/// One outgoing reference of a record field: the owner bucket (structured fields only) and the
/// referenced record.
pub type Reference = (Option<Id>, Fqid);

/// Sources referencing one target, bucketed by owner.
pub type Referrers = BTreeMap<Option<Id>, BTreeSet<Id>>;

/// `(collection, id field)` of the referencing side.
pub type TableKey = (String, String);

/// Extract the references held by `value`, a stored value of `descriptor`'s id field.
///
/// Generic fields only yield fqids inside the candidate set.
pub fn references_of(descriptor: &RelationDescriptor, value: &Value) -> BTreeSet<Reference> {
    match value {
        Value::Structured(owners) => owners
            .iter()
            .flat_map(|(owner, value)| {
                flat_references(descriptor, value)
                    .into_iter()
                    .map(move |fqid| (Some(*owner), fqid))
            })
            .collect(),
        value => flat_references(descriptor, value)
            .into_iter()
            .map(|fqid| (None, fqid))
            .collect(),
    }
}

fn flat_references(descriptor: &RelationDescriptor, value: &Value) -> Vec<Fqid> {
    match &descriptor.foreign {
        Foreign::Collection(collection) => value
            .ids()
            .into_iter()
            .map(|id| Fqid::new(collection.as_str(), id))
            .collect(),
        Foreign::Candidates(_) => value
            .fqids()
            .into_iter()
            .filter(|fqid| descriptor.foreign.contains(&fqid.collection))
            .cloned()
            .collect(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseIndex {
    tables: BTreeMap<TableKey, BTreeMap<Fqid, Referrers>>,
    /// Entries of deleted targets that are still referenced, set aside until the target is
    /// created again. A target leaves this map once its last referrer lets go of it.
    parked: BTreeMap<Fqid, BTreeMap<TableKey, Referrers>>,
}

fn remove_source(referrers: &mut Referrers, owner: &Option<Id>, source: Id) {
    if let Some(sources) = referrers.get_mut(owner) {
        sources.remove(&source);
        if sources.is_empty() {
            referrers.remove(owner);
        }
    }
}

impl ReverseIndex {
    pub fn new(fields: impl IntoIterator<Item = TableKey>) -> ReverseIndex {
        ReverseIndex {
            tables: fields
                .into_iter()
                .map(|key| (key, BTreeMap::new()))
                .collect(),
            parked: BTreeMap::new(),
        }
    }

    pub fn is_indexed(&self, collection: &str, field: &str) -> bool {
        self.tables
            .contains_key(&(collection.to_string(), field.to_string()))
    }

    pub fn tables(&self) -> &BTreeMap<TableKey, BTreeMap<Fqid, Referrers>> {
        &self.tables
    }

    /// True if `target` was deleted while still referenced, and is referenced still.
    pub fn is_dropped(&self, target: &Fqid) -> bool {
        self.parked.contains_key(target)
    }

    /// Number of deleted targets whose entries are set aside.
    pub fn dropped_len(&self) -> usize {
        self.parked.len()
    }

    /// Replace the references of `source` in `collection.field`: `old` is what the field held
    /// before the change, `new` what it holds now. Only the difference touches the index.
    pub fn update(
        &mut self,
        collection: &str,
        field: &str,
        source: Id,
        old: &BTreeSet<Reference>,
        new: &BTreeSet<Reference>,
    ) {
        let key = (collection.to_string(), field.to_string());
        let Some(table) = self.tables.get_mut(&key) else {
            return;
        };
        for (owner, target) in old.difference(new) {
            if let Some(parked) = self.parked.get_mut(target) {
                if let Some(referrers) = parked.get_mut(&key) {
                    remove_source(referrers, owner, source);
                    if referrers.is_empty() {
                        parked.remove(&key);
                    }
                }
                if parked.is_empty() {
                    self.parked.remove(target);
                }
                continue;
            }
            let Some(referrers) = table.get_mut(target) else {
                continue;
            };
            remove_source(referrers, owner, source);
            if referrers.is_empty() {
                table.remove(target);
            }
        }
        for (owner, target) in new.difference(old) {
            let referrers = match self.parked.get_mut(target) {
                Some(parked) => parked.entry(key.clone()).or_default(),
                None => table.entry(target.clone()).or_default(),
            };
            referrers.entry(*owner).or_default().insert(source);
        }
    }

    /// Sources in `collection.field` that reference `target`, for `owner` or for any owner.
    pub fn lookup(
        &self,
        collection: &str,
        field: &str,
        target: &Fqid,
        owner: Option<Id>,
    ) -> BTreeSet<Id> {
        let Some(referrers) = self
            .tables
            .get(&(collection.to_string(), field.to_string()))
            .and_then(|table| table.get(target))
        else {
            return BTreeSet::new();
        };
        match owner {
            Some(owner) => referrers
                .get(&Some(owner))
                .cloned()
                .unwrap_or_default(),
            None => referrers.values().flatten().copied().collect(),
        }
    }

    /// Take every entry in which `target` is the referenced record out of the lookup tables.
    /// Entries are kept aside only if there are any.
    pub fn drop_target(&mut self, target: &Fqid) {
        let parked = self
            .tables
            .iter_mut()
            .filter_map(|(key, table)| Some((key.clone(), table.remove(target)?)))
            .collect::<BTreeMap<_, _>>();
        if !parked.is_empty() {
            self.parked.insert(target.clone(), parked);
        }
    }

    /// Put the set-aside entries of a re-created `target` back. Returns the number of tables
    /// restored.
    pub fn revive_target(&mut self, target: &Fqid) -> usize {
        let Some(parked) = self.parked.remove(target) else {
            return 0;
        };
        let restored = parked.len();
        for (key, referrers) in parked {
            if let Some(table) = self.tables.get_mut(&key) {
                table.insert(target.clone(), referrers);
            }
        }
        restored
    }
}
