use std::collections::BTreeSet;

use crate::{
    key::{Fqid, Id},
    relation::descriptor::{Foreign, RelationDescriptor},
    store::{Record, Store},
    value::{cmp_optional, Value},
    GraphError,
};

/// Answers relation queries against one [Store] snapshot.
///
/// Misses are never errors: a reference to an unloaded record, a generic reference outside the
/// candidate set and a structured relation without an owner all resolve to nothing.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'s> {
    store: &'s Store,
}

impl<'s> Resolver<'s> {
    pub fn new(store: &'s Store) -> Resolver<'s> {
        Resolver { store }
    }

    pub fn store(&self) -> &'s Store {
        self.store
    }

    /// Resolve the relation named `field` of the record `source`.
    ///
    /// Fails only if `field` is not a declared relation of the source's collection.
    pub fn resolve_field(
        &self,
        source: &Fqid,
        field: &str,
        owner: Option<Id>,
    ) -> Result<Vec<&'s Record>, GraphError> {
        let descriptor = self.store.registry().require(&source.collection, field)?;
        match self.store.get(source) {
            Some(record) => Ok(self.resolve(descriptor, record, owner)),
            None => {
                tracing::debug!("[Resolver] source {source} is not loaded");
                Ok(Vec::new())
            }
        }
    }

    /// Resolve `descriptor` for `source`. Many-relations come back ordered, one-relations as at
    /// most one record.
    pub fn resolve(
        &self,
        descriptor: &RelationDescriptor,
        source: &Record,
        owner: Option<Id>,
    ) -> Vec<&'s Record> {
        if descriptor.is_structured() && owner.is_none() {
            tracing::debug!(
                "[Resolver] {}.{} is structured and no owner was given",
                source.fqid(),
                descriptor.own_field
            );
            return Vec::new();
        }

        let targets = match self.explicit_value(descriptor, source, owner) {
            Some(value) => targets_of(descriptor, value),
            None => self.reverse_targets(descriptor, source, owner),
        };

        let mut related = targets
            .iter()
            .filter_map(|fqid| {
                let record = self.store.get(fqid);
                if record.is_none() {
                    tracing::debug!(
                        "[Resolver] {}.{} references {fqid}, which is not loaded",
                        source.fqid(),
                        descriptor.own_field
                    );
                }
                record
            })
            .collect::<Vec<_>>();

        if descriptor.is_many() {
            order_records(&mut related, descriptor.order.as_deref());
        } else {
            related.truncate(1);
        }
        related
    }

    /// Resolve a fully-qualified id against a candidate set.
    pub fn resolve_generic(&self, fqid: &Fqid, candidates: &Foreign) -> Option<&'s Record> {
        if !candidates.contains(&fqid.collection) {
            tracing::debug!(
                "[Resolver] {fqid} is outside the candidate set {}",
                candidates.collections().join("|")
            );
            return None;
        }
        self.store.get(fqid)
    }

    fn explicit_value<'r>(
        &self,
        descriptor: &RelationDescriptor,
        source: &'r Record,
        owner: Option<Id>,
    ) -> Option<&'r Value> {
        let value = source.get(&descriptor.own_id_field.key())?;
        match (descriptor.is_structured(), owner) {
            (true, Some(owner)) => value.for_owner(owner),
            _ => Some(value),
        }
    }

    /// Targets found through the reverse index of the paired descriptor, for records that do
    /// not carry the id field themselves.
    fn reverse_targets(
        &self,
        descriptor: &RelationDescriptor,
        source: &Record,
        owner: Option<Id>,
    ) -> Vec<Fqid> {
        let Some(pair) = self.store.registry().pair_of(descriptor) else {
            return Vec::new();
        };
        let lookup_owner = match (descriptor.is_structured(), pair.is_structured()) {
            (_, true) => owner,
            (false, false) => None,
            (true, false) => {
                tracing::debug!(
                    "[Resolver] {}.{} has no value for owner {owner:?} and its pair is not owner-scoped",
                    source.fqid(),
                    descriptor.own_field
                );
                return Vec::new();
            }
        };
        let id_field = pair.own_id_field.key();
        pair.own_collections
            .iter()
            .filter(|collection| descriptor.foreign.contains(collection))
            .flat_map(|collection| {
                self.store
                    .referrers(collection, &id_field, source.fqid(), lookup_owner)
                    .into_iter()
                    .map(move |id| Fqid::new(collection.as_str(), id))
            })
            .collect()
    }
}

/// The targets a stored id value points to, in stored order and without repeats.
fn targets_of(descriptor: &RelationDescriptor, value: &Value) -> Vec<Fqid> {
    let mut seen = BTreeSet::new();
    let targets: Vec<Fqid> = match &descriptor.foreign {
        Foreign::Collection(collection) => value
            .ids()
            .into_iter()
            .map(|id| Fqid::new(collection.as_str(), id))
            .collect(),
        Foreign::Candidates(_) => value
            .fqids()
            .into_iter()
            .filter(|fqid| {
                let inside = descriptor.foreign.contains(&fqid.collection);
                if !inside {
                    tracing::debug!(
                        "[Resolver] ignoring {fqid} in {}: not a candidate",
                        descriptor.own_field
                    );
                }
                inside
            })
            .cloned()
            .collect(),
    };
    targets
        .into_iter()
        .filter(|fqid| seen.insert(fqid.clone()))
        .collect()
}

/// Sort a many-relation: by `order` ascending with the id as tie-break, records lacking the
/// order field last. Without an order field, by ascending id.
pub fn order_records(records: &mut [&Record], order: Option<&str>) {
    match order {
        Some(field) => records.sort_by(|a, b| {
            cmp_optional(a.get(field), b.get(field))
                .then_with(|| a.id().cmp(&b.id()))
                .then_with(|| a.collection().cmp(b.collection()))
        }),
        None => records.sort_by(|a, b| {
            a.id()
                .cmp(&b.id())
                .then_with(|| a.collection().cmp(b.collection()))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::DeltaBatch,
        relation::{make_generic_o2o, make_m2o, GenericO2O, Registry, M2O},
    };
    use serde_json::json;
    use std::sync::Arc;
    use test_log::test;

    fn store() -> Store {
        let registry = Registry::builder()
            .add(make_m2o(M2O {
                one: "meeting",
                many: "motion",
                one_field: "motions",
                many_field: "meeting",
                one_id_field: Some("motion_ids"),
                order: Some("sort_weight"),
                ..Default::default()
            }))
            .add(make_generic_o2o(GenericO2O {
                owner: "agenda_item",
                owner_field: "content_object",
                candidates: &["motion", "topic"],
                candidate_field: "agenda_item",
                ..Default::default()
            }))
            .build()
            .unwrap();
        Store::new(Arc::new(registry))
    }

    fn ids(records: &[&Record]) -> Vec<Id> {
        records.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_explicit_array_wins_over_index() {
        let mut store = store();
        store
            .apply(
                DeltaBatch::new()
                    .update("meeting", 1, json!({"motion_ids": [3]}))
                    .update("motion", 3, json!({"meeting_id": 1}))
                    .update("motion", 4, json!({"meeting_id": 1})),
            )
            .unwrap();
        let resolver = Resolver::new(&store);
        let meeting = Fqid::new("meeting", 1);
        assert_eq!(
            ids(&resolver.resolve_field(&meeting, "motions", None).unwrap()),
            vec![3]
        );
    }

    #[test]
    fn test_missing_order_values_sort_last() {
        let mut store = store();
        store
            .apply(
                DeltaBatch::new()
                    .update("meeting", 1, json!({}))
                    .update("motion", 7, json!({"meeting_id": 1}))
                    .update("motion", 8, json!({"meeting_id": 1, "sort_weight": 9}))
                    .update("motion", 9, json!({"meeting_id": 1, "sort_weight": 1}))
                    .update("motion", 2, json!({"meeting_id": 1})),
            )
            .unwrap();
        let resolver = Resolver::new(&store);
        let motions = resolver
            .resolve_field(&Fqid::new("meeting", 1), "motions", None)
            .unwrap();
        assert_eq!(ids(&motions), vec![9, 8, 2, 7]);
    }

    #[test]
    fn test_one_side_and_unloaded_targets() {
        let mut store = store();
        store
            .apply(DeltaBatch::new().update("motion", 3, json!({"meeting_id": 1})))
            .unwrap();
        let resolver = Resolver::new(&store);
        let motion = Fqid::new("motion", 3);
        // meeting/1 is not loaded yet
        assert!(resolver.resolve_field(&motion, "meeting", None).unwrap().is_empty());
        assert!(matches!(
            resolver.resolve_field(&motion, "author", None),
            Err(GraphError::UnknownRelation { .. })
        ));
        assert!(resolver
            .resolve_field(&Fqid::new("motion", 99), "meeting", None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_generic_resolution() {
        let mut store = store();
        store
            .apply(
                DeltaBatch::new()
                    .update("motion", 5, json!({"title": "M"}))
                    .update("user", 5, json!({"name": "U"}))
                    .update("agenda_item", 1, json!({"content_object_id": "motion/5"}))
                    .update("agenda_item", 2, json!({"content_object_id": "user/5"})),
            )
            .unwrap();
        let resolver = Resolver::new(&store);

        let content = resolver
            .resolve_field(&Fqid::new("agenda_item", 1), "content_object", None)
            .unwrap();
        assert_eq!(content[0].fqid(), &Fqid::new("motion", 5));
        assert!(resolver
            .resolve_field(&Fqid::new("agenda_item", 2), "content_object", None)
            .unwrap()
            .is_empty());

        let candidates = Foreign::Candidates(vec!["motion".into(), "topic".into()]);
        assert!(resolver
            .resolve_generic(&Fqid::new("user", 5), &candidates)
            .is_none());
        assert!(resolver
            .resolve_generic(&Fqid::new("topic", 5), &candidates)
            .is_none());

        // The reverse side has no agenda_item_id, so it is answered by the index
        let item = resolver
            .resolve_field(&Fqid::new("motion", 5), "agenda_item", None)
            .unwrap();
        assert_eq!(ids(&item), vec![1]);
    }
}
