use parking_lot::{RwLock, RwLockReadGuard};
use serde_json::Value as JsonValue;
use std::{
    collections::{btree_map::Entry as BTreeEntry, BTreeMap, BTreeSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::broadcast;

use crate::{
    config::GraphConfig,
    event::{CommitNotice, Delta, DeltaBatch},
    key::{Fqid, Id},
    relation::Registry,
    store::{
        index::{references_of, Reference, Referrers, ReverseIndex, TableKey},
        record::Record,
    },
    value::Value,
    GraphError,
};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// One committed state of one [Store]: the store's process-unique id and its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation {
    pub store: u64,
    pub sequence: u64,
}

/// The normalized record store.
///
/// Records live in one id-keyed arena per collection. Every relation id field declared in the
/// [Registry] is mirrored in a [ReverseIndex] that is updated as part of the same
/// [Store::apply] call, so readers never observe a forward pointer without its reverse entry.
#[derive(Debug)]
pub struct Store {
    id: u64,
    registry: Arc<Registry>,
    collections: BTreeMap<String, BTreeMap<Id, Record>>,
    index: ReverseIndex,
    sequence: u64,
    notify: broadcast::Sender<CommitNotice>,
    config: GraphConfig,
}

impl Store {
    pub fn new(registry: Arc<Registry>) -> Store {
        Store::with_config(registry, &GraphConfig::default())
    }

    pub fn with_config(registry: Arc<Registry>, config: &GraphConfig) -> Store {
        let (notify, _) = broadcast::channel(config.notify_capacity.max(1));
        let index = ReverseIndex::new(registry.indexed_fields());
        Store {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            registry,
            collections: BTreeMap::new(),
            index,
            sequence: 0,
            notify,
            config: config.clone(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Sequence number of the last committed batch. Zero before the first commit.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn generation(&self) -> Generation {
        Generation {
            store: self.id,
            sequence: self.sequence,
        }
    }

    pub fn index(&self) -> &ReverseIndex {
        &self.index
    }

    pub fn get(&self, fqid: &Fqid) -> Option<&Record> {
        self.get_in(&fqid.collection, fqid.id)
    }

    pub fn get_in(&self, collection: &str, id: Id) -> Option<&Record> {
        self.collections.get(collection)?.get(&id)
    }

    pub fn contains(&self, fqid: &Fqid) -> bool {
        self.get(fqid).is_some()
    }

    pub fn records<'a>(&'a self, collection: &str) -> impl Iterator<Item = &'a Record> + 'a {
        self.collections
            .get(collection)
            .into_iter()
            .flat_map(|arena| arena.values())
    }

    pub fn len(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive one [CommitNotice] per committed batch. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<CommitNotice> {
        self.notify.subscribe()
    }

    /// Ids of `collection` records whose `field` references `target`, read from the reverse
    /// index.
    pub fn referrers(
        &self,
        collection: &str,
        field: &str,
        target: &Fqid,
        owner: Option<Id>,
    ) -> BTreeSet<Id> {
        self.index.lookup(collection, field, target, owner)
    }

    /// Parse a JSON delta batch and apply it.
    pub fn apply_json(&mut self, json: &str) -> Result<CommitNotice, GraphError> {
        let batch: DeltaBatch = serde_json::from_str(json)?;
        self.apply(batch)
    }

    /// Apply a batch of deltas atomically and notify subscribers once.
    ///
    /// Returns the notice that was broadcast. Fails only when index verification is enabled
    /// and finds drift; the batch is committed in that case as well.
    #[tracing::instrument(skip_all, fields(deltas = batch.len()))]
    pub fn apply(&mut self, batch: DeltaBatch) -> Result<CommitNotice, GraphError> {
        if batch.is_empty() {
            return Ok(CommitNotice {
                sequence: self.sequence,
                ..Default::default()
            });
        }
        let stamp = self.sequence + 1;
        let mut notice = CommitNotice {
            sequence: stamp,
            ..Default::default()
        };
        for delta in batch {
            match delta {
                Delta::Update {
                    fqid,
                    changed_fields,
                } => {
                    self.apply_update(&fqid, changed_fields, stamp);
                    notice.deleted.remove(&fqid);
                    notice.changed.insert(fqid);
                }
                Delta::Delete { fqid } => {
                    if self.apply_delete(&fqid) {
                        notice.changed.remove(&fqid);
                        notice.deleted.insert(fqid);
                    } else {
                        tracing::debug!("[Store::apply] ignoring delete of unknown record {fqid}");
                    }
                }
            }
        }
        self.sequence = stamp;
        tracing::info!(
            "[Store::apply] committed sequence {stamp}: {} changed, {} deleted",
            notice.changed.len(),
            notice.deleted.len()
        );

        if self.notify.send(notice.clone()).is_err() {
            tracing::trace!("[Store::apply] no subscribers for sequence {stamp}");
        }

        if self.config.verify_index {
            self.verify_index()?;
        }
        Ok(notice)
    }

    fn apply_update(
        &mut self,
        fqid: &Fqid,
        changed_fields: serde_json::Map<String, JsonValue>,
        stamp: u64,
    ) {
        let registry = self.registry.clone();
        let collection = fqid.collection.as_str();
        let arena = self.collections.entry(fqid.collection.clone()).or_default();
        let created = !arena.contains_key(&fqid.id);
        let record = arena
            .entry(fqid.id)
            .or_insert_with(|| Record::new(fqid.clone(), stamp));

        // References held by each indexed field before this delta touched it.
        let mut previous = BTreeMap::<String, BTreeSet<Reference>>::new();
        for (name, raw) in changed_fields {
            // The folded per-owner map lives under the template name; only concrete names
            // (`group_$7_ids`) may change it.
            if registry
                .by_id_field(collection, &name)
                .is_some_and(|descriptor| descriptor.own_id_field.is_structured())
            {
                tracing::warn!(
                    "[Store::apply] {fqid}: ignoring `{name}`, a structured template without an owner id"
                );
                continue;
            }
            let (key, owner) = match registry.match_structured(collection, &name) {
                Some((template, owner)) => (template.template(), Some(owner)),
                None => (name, None),
            };
            if let BTreeEntry::Vacant(slot) = previous.entry(key.clone()) {
                if let Some(descriptor) = registry.by_id_field(collection, &key) {
                    slot.insert(
                        record
                            .get(&key)
                            .map(|value| references_of(descriptor, value))
                            .unwrap_or_default(),
                    );
                }
            }
            let value = match raw {
                JsonValue::Null => None,
                raw => Some(Value::decode(raw, registry.decoding(collection, &key))),
            };
            match (owner, value) {
                (Some(owner), value) => record.set_structured(&key, owner, value),
                (None, Some(value)) => record.set(key, value),
                (None, None) => {
                    record.remove(&key);
                }
            }
        }
        record.touch(stamp);

        for (key, old) in previous {
            let Some(descriptor) = registry.by_id_field(collection, &key) else {
                continue;
            };
            let new = record
                .get(&key)
                .map(|value| references_of(descriptor, value))
                .unwrap_or_default();
            self.index.update(collection, &key, fqid.id, &old, &new);
        }

        if created {
            let restored = self.index.revive_target(fqid);
            if restored > 0 {
                tracing::debug!("[Store] {fqid} is back, restored its entries in {restored} table(s)");
            }
        }
    }

    /// Remove a record, its outgoing index entries, and every index entry that targets it.
    fn apply_delete(&mut self, fqid: &Fqid) -> bool {
        let Some(record) = self
            .collections
            .get_mut(&fqid.collection)
            .and_then(|arena| arena.remove(&fqid.id))
        else {
            return false;
        };
        for (key, value) in record.fields() {
            if let Some(descriptor) = self.registry.by_id_field(&fqid.collection, key) {
                let old = references_of(descriptor, value);
                self.index
                    .update(&fqid.collection, key, fqid.id, &old, &BTreeSet::new());
            }
        }
        self.index.drop_target(fqid);
        true
    }

    /// Linear-scan fallback for [Store::referrers]. Walks every record of `collection`.
    pub fn scan_referrers(
        &self,
        collection: &str,
        field: &str,
        target: &Fqid,
        owner: Option<Id>,
    ) -> BTreeSet<Id> {
        let Some(descriptor) = self.registry.by_id_field(collection, field) else {
            return BTreeSet::new();
        };
        self.records(collection)
            .filter(|record| {
                record.get(field).is_some_and(|value| {
                    references_of(descriptor, value)
                        .iter()
                        .any(|(o, t)| t == target && (owner.is_none() || *o == owner))
                })
            })
            .map(Record::id)
            .collect()
    }

    fn scan_table(&self, key: &TableKey, only: Option<&Fqid>) -> BTreeMap<Fqid, Referrers> {
        let (collection, field) = key;
        let mut table = BTreeMap::<Fqid, Referrers>::new();
        let Some(descriptor) = self.registry.by_id_field(collection, field) else {
            return table;
        };
        for record in self.records(collection) {
            let Some(value) = record.get(field) else {
                continue;
            };
            for (owner, target) in references_of(descriptor, value) {
                if only.is_some_and(|only| *only != target) || self.index.is_dropped(&target) {
                    continue;
                }
                table
                    .entry(target)
                    .or_default()
                    .entry(owner)
                    .or_default()
                    .insert(record.id());
            }
        }
        table
    }

    /// Compare every reverse index table with a linear scan of the store.
    pub fn verify_index(&self) -> Result<(), GraphError> {
        let mut drift = Vec::new();
        for (key, table) in self.index.tables() {
            let expected = self.scan_table(key, None);
            if *table != expected {
                let targets = table
                    .keys()
                    .chain(expected.keys())
                    .filter(|t| table.get(*t) != expected.get(*t))
                    .map(|t| t.to_string())
                    .collect::<BTreeSet<_>>();
                drift.push(format!(
                    "{}.{} differs for {}",
                    key.0,
                    key.1,
                    targets.into_iter().collect::<Vec<_>>().join(", ")
                ));
            }
        }
        if drift.is_empty() {
            Ok(())
        } else {
            tracing::warn!("[Store::verify_index] {}", drift.join("; "));
            Err(GraphError::IndexInconsistent(drift.join("; ")))
        }
    }
}

/// Process-wide handle to a [Store] with a single writer path.
#[derive(Debug, Clone)]
pub struct SharedStore(Arc<RwLock<Store>>);

impl SharedStore {
    pub fn new(store: Store) -> SharedStore {
        SharedStore(Arc::new(RwLock::new(store)))
    }

    /// Apply a batch under the write lock. Readers see either none or all of it.
    pub fn apply(&self, batch: DeltaBatch) -> Result<CommitNotice, GraphError> {
        self.0.write().apply(batch)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.0.read()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommitNotice> {
        self.0.read().subscribe()
    }

    pub fn sequence(&self) -> u64 {
        self.0.read().sequence()
    }
}
