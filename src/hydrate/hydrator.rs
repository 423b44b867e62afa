use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;

use crate::{
    hydrate::{cache::RelationCache, context::ResolveContext},
    key::{Fqid, Id},
    relation::{RelationDescriptor, Resolver},
    store::{Record, Store},
    value::Value,
    GraphError,
};

/// Produces [ViewModel]s over one store snapshot.
///
/// A hydrator borrows the store, so it cannot outlive a commit; build a new one after
/// [Store::apply]. Relation results can be memoized across hydrators in a shared
/// [RelationCache].
#[derive(Debug)]
pub struct Hydrator<'s> {
    store: &'s Store,
    context: ResolveContext,
    cache: Option<&'s RelationCache>,
}

impl<'s> Hydrator<'s> {
    pub fn new(store: &'s Store) -> Hydrator<'s> {
        Hydrator {
            store,
            context: ResolveContext::default(),
            cache: None,
        }
    }

    /// A hydrator that uses `cache` if the store's config enables relation caching.
    pub fn from_config(store: &'s Store, cache: &'s RelationCache) -> Hydrator<'s> {
        let hydrator = Hydrator::new(store);
        if store.config().cache_relations {
            hydrator.with_cache(cache)
        } else {
            hydrator
        }
    }

    pub fn with_context(mut self, context: ResolveContext) -> Hydrator<'s> {
        self.context = context;
        self
    }

    pub fn with_cache(mut self, cache: &'s RelationCache) -> Hydrator<'s> {
        self.cache = Some(cache);
        self
    }

    pub fn store(&self) -> &'s Store {
        self.store
    }

    pub fn context(&self) -> &ResolveContext {
        &self.context
    }

    pub fn view<'a>(&'a self, fqid: &Fqid) -> Option<ViewModel<'a>> {
        self.store.get(fqid).map(|record| ViewModel {
            hydrator: self,
            record,
        })
    }

    pub fn view_in<'a>(&'a self, collection: &str, id: Id) -> Option<ViewModel<'a>> {
        self.store.get_in(collection, id).map(|record| ViewModel {
            hydrator: self,
            record,
        })
    }

    pub fn get<'a, V: TypedView<'a>>(&'a self, id: Id) -> Option<V> {
        self.view_in(V::COLLECTION, id).and_then(V::from_view)
    }

    /// Every loaded record of `V`'s collection, by ascending id.
    pub fn all<'a, V: TypedView<'a>>(&'a self) -> Vec<V> {
        self.store
            .records(V::COLLECTION)
            .filter_map(|record| {
                V::from_view(ViewModel {
                    hydrator: self,
                    record,
                })
            })
            .collect()
    }

    /// The owner a structured relation resolves for: `explicit`, else the context attribute the
    /// descriptor names.
    fn owner_for(&self, descriptor: &RelationDescriptor, explicit: Option<Id>) -> Option<Id> {
        if !descriptor.is_structured() {
            return None;
        }
        explicit.or_else(|| {
            descriptor
                .owner_attribute
                .as_deref()
                .and_then(|attribute| self.context.get(attribute))
        })
    }

    fn relation(
        &self,
        source: &Record,
        field: &str,
        explicit_owner: Option<Id>,
    ) -> Result<Vec<&'s Record>, GraphError> {
        let descriptor = self.store.registry().require(source.collection(), field)?;
        let owner = self.owner_for(descriptor, explicit_owner);
        let resolver = Resolver::new(self.store);
        let Some(cache) = self.cache else {
            return Ok(resolver.resolve(descriptor, source, owner));
        };

        let key = (source.fqid().clone(), field.to_string(), owner);
        let generation = self.store.generation();
        if let Some(related) = cache.get(&key, generation) {
            return Ok(related
                .iter()
                .filter_map(|fqid| self.store.get(fqid))
                .collect());
        }
        let related = resolver.resolve(descriptor, source, owner);
        cache.insert(
            key,
            generation,
            related.iter().map(|record| record.fqid().clone()).collect(),
        );
        Ok(related)
    }
}

/// Access to the untyped view behind a typed view.
pub trait AsView<'a> {
    fn view(&self) -> &ViewModel<'a>;
}

/// A view bound to one collection.
pub trait TypedView<'a>: AsView<'a> + Sized {
    const COLLECTION: &'static str;

    fn from_view(view: ViewModel<'a>) -> Option<Self>;
}

/// A record plus relation-aware accessors. Relations are resolved on every access (or served
/// from the hydrator's cache), never materialized eagerly.
#[derive(Clone, Copy)]
pub struct ViewModel<'a> {
    hydrator: &'a Hydrator<'a>,
    record: &'a Record,
}

impl fmt::Debug for ViewModel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModel")
            .field("fqid", self.record.fqid())
            .field("stamp", &self.record.stamp())
            .finish()
    }
}

impl PartialEq for ViewModel<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.record.fqid() == other.record.fqid() && self.record.stamp() == other.record.stamp()
    }
}

impl<'a> AsView<'a> for ViewModel<'a> {
    fn view(&self) -> &ViewModel<'a> {
        self
    }
}

impl<'a> ViewModel<'a> {
    pub fn fqid(&self) -> &'a Fqid {
        self.record.fqid()
    }

    pub fn id(&self) -> Id {
        self.record.id()
    }

    pub fn collection(&self) -> &'a str {
        self.record.collection()
    }

    pub fn record(&self) -> &'a Record {
        self.record
    }

    pub fn hydrator(&self) -> &'a Hydrator<'a> {
        self.hydrator
    }

    /// Store sequence of the record's last mutation.
    pub fn stamp(&self) -> u64 {
        self.record.stamp()
    }

    pub fn field(&self, name: &str) -> Option<&'a Value> {
        self.record.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&'a str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn int_field(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(Value::as_i64)
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.field(name).and_then(Value::as_bool)
    }

    /// The value of a structured field (stored under its template name) for one owner.
    pub fn structured_field(&self, template: &str, owner: Id) -> Option<&'a Value> {
        self.field(template).and_then(|value| value.for_owner(owner))
    }

    pub fn try_many(&self, field: &str, owner: Option<Id>) -> Result<Vec<ViewModel<'a>>, GraphError> {
        let hydrator = self.hydrator;
        Ok(hydrator
            .relation(self.record, field, owner)?
            .into_iter()
            .map(|record| ViewModel { hydrator, record })
            .collect())
    }

    pub fn try_one(&self, field: &str, owner: Option<Id>) -> Result<Option<ViewModel<'a>>, GraphError> {
        Ok(self.try_many(field, owner)?.into_iter().next())
    }

    /// Related views of a many-relation, ordered. An undeclared relation yields nothing.
    pub fn many(&self, field: &str) -> Vec<ViewModel<'a>> {
        self.many_for(field, None)
    }

    pub fn many_for(&self, field: &str, owner: Option<Id>) -> Vec<ViewModel<'a>> {
        self.try_many(field, owner).unwrap_or_else(|e| {
            tracing::warn!("[ViewModel] {}: {e}", self.fqid());
            Vec::new()
        })
    }

    pub fn one(&self, field: &str) -> Option<ViewModel<'a>> {
        self.one_for(field, None)
    }

    pub fn one_for(&self, field: &str, owner: Option<Id>) -> Option<ViewModel<'a>> {
        self.many_for(field, owner).into_iter().next()
    }

    /// Fields of the record as a JSON object, structured fields under their template name.
    pub fn to_json(&self) -> JsonValue {
        let mut map = JsonMap::new();
        map.insert("id".to_string(), JsonValue::from(self.id()));
        for (name, value) in self.record.fields() {
            map.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }
}
