use std::collections::{BTreeMap, BTreeSet};

use crate::{
    key::Id,
    relation::{
        descriptor::{FieldTemplate, Foreign, IdField, RelationDescriptor, TEMPLATE_PLACEHOLDER},
        factory::RelationPair,
    },
    value::Decoding,
    GraphError,
};

/// Collects relation declarations and verifies them into a [Registry].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    descriptors: Vec<RelationDescriptor>,
    errors: Vec<GraphError>,
}

impl RegistryBuilder {
    pub fn new() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Add a descriptor pair produced by one of the [crate::relation::factory] functions.
    pub fn add(mut self, pair: RelationPair) -> RegistryBuilder {
        match pair {
            Ok(descriptors) => self.descriptors.extend(descriptors),
            Err(e) => self.errors.push(e),
        }
        self
    }

    /// Add a single hand-written descriptor. Its pair must be declared as well or
    /// [RegistryBuilder::build] fails.
    pub fn descriptor(mut self, descriptor: RelationDescriptor) -> RegistryBuilder {
        self.descriptors.push(descriptor);
        self
    }

    pub fn build(self) -> Result<Registry, GraphError> {
        let mut errors = self.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>();

        let mut by_field = BTreeMap::<(String, String), usize>::new();
        let mut by_id_field = BTreeMap::<(String, String), usize>::new();
        for (idx, descriptor) in self.descriptors.iter().enumerate() {
            errors.extend(shape_errors(descriptor));
            for collection in descriptor.own_collections.iter() {
                let field_key = (collection.clone(), descriptor.own_field.clone());
                if by_field.insert(field_key, idx).is_some() {
                    errors.push(format!(
                        "relation `{}` is declared more than once on `{collection}`",
                        descriptor.own_field
                    ));
                }
                let id_key = (collection.clone(), descriptor.own_id_field.key());
                if let Some(other) = by_id_field.insert(id_key, idx) {
                    errors.push(format!(
                        "`{collection}.{}` backs both `{}` and `{}`",
                        descriptor.own_id_field,
                        self.descriptors[other].own_field,
                        descriptor.own_field
                    ));
                }
            }
        }

        for descriptor in self.descriptors.iter() {
            errors.extend(pair_errors(descriptor, &self.descriptors, &by_field));
        }

        if !errors.is_empty() {
            tracing::warn!(
                "[RegistryBuilder::build] rejecting relation table:\n- {}",
                errors.join("\n- ")
            );
            return Err(GraphError::InvalidRegistry(errors.join("; ")));
        }

        let registry = Registry {
            descriptors: self.descriptors,
            by_field,
            by_id_field,
        };
        tracing::info!(
            "[RegistryBuilder::build] registered {} relation descriptors over {} collections",
            registry.descriptors.len(),
            registry.collections().len()
        );
        Ok(registry)
    }
}

fn shape_errors(descriptor: &RelationDescriptor) -> Vec<String> {
    let mut errors = Vec::new();
    if descriptor.own_field.trim().is_empty() {
        errors.push(format!("descriptor {descriptor} has an empty field name"));
    }
    if descriptor.own_collections.is_empty()
        || descriptor.own_collections.iter().any(|c| c.trim().is_empty())
    {
        errors.push(format!("descriptor {descriptor} has no own collection"));
    }
    match &descriptor.foreign {
        Foreign::Collection(c) if c.trim().is_empty() => {
            errors.push(format!("descriptor {descriptor} has no foreign collection"));
        }
        Foreign::Candidates(cs) if cs.is_empty() || cs.iter().any(|c| c.trim().is_empty()) => {
            errors.push(format!(
                "generic descriptor {descriptor} needs a non-empty candidate set"
            ));
        }
        _ => {}
    }
    if let IdField::Plain(name) = &descriptor.own_id_field {
        if name.trim().is_empty() {
            errors.push(format!("descriptor {descriptor} has an empty id field"));
        }
    }
    if descriptor.is_structured() && descriptor.owner_attribute.is_none() {
        errors.push(format!(
            "structured descriptor {descriptor} names no owner attribute"
        ));
    }
    errors
}

fn pair_errors(
    descriptor: &RelationDescriptor,
    descriptors: &[RelationDescriptor],
    by_field: &BTreeMap<(String, String), usize>,
) -> Vec<String> {
    let Some(pair_field) = descriptor.pair_field.as_ref() else {
        return vec![format!("descriptor {descriptor} has no reverse pair")];
    };
    let mut errors = Vec::new();
    for foreign in descriptor.foreign.collections() {
        let Some(pair) = by_field
            .get(&(foreign.to_string(), pair_field.clone()))
            .map(|idx| &descriptors[*idx])
        else {
            errors.push(format!(
                "descriptor {descriptor} expects reverse `{foreign}.{pair_field}`, which is not declared"
            ));
            continue;
        };
        if pair.pair_field.as_deref() != Some(descriptor.own_field.as_str()) {
            errors.push(format!(
                "`{foreign}.{pair_field}` points back to `{}`, expected `{}`",
                pair.pair_field.as_deref().unwrap_or("<none>"),
                descriptor.own_field
            ));
        }
        for own in descriptor.own_collections.iter() {
            if !pair.foreign.contains(own) {
                errors.push(format!(
                    "`{foreign}.{pair_field}` does not reach `{own}` (reaches {})",
                    pair.foreign.collections().join("|")
                ));
            }
        }
        if descriptor.is_generic() && pair.is_generic() {
            errors.push(format!(
                "`{foreign}.{pair_field}` and {descriptor} are both generic"
            ));
        }
    }
    errors
}

/// The verified relation table.
///
/// Descriptors are addressed by `(collection, logical field)`. A reverse lookup by
/// `(collection, id field)` supports decoding wire values and maintaining the reverse index.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    descriptors: Vec<RelationDescriptor>,
    by_field: BTreeMap<(String, String), usize>,
    by_id_field: BTreeMap<(String, String), usize>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> &[RelationDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, collection: &str, field: &str) -> Option<&RelationDescriptor> {
        self.by_field
            .get(&(collection.to_string(), field.to_string()))
            .map(|idx| &self.descriptors[*idx])
    }

    pub fn require(&self, collection: &str, field: &str) -> Result<&RelationDescriptor, GraphError> {
        self.get(collection, field)
            .ok_or_else(|| GraphError::UnknownRelation {
                collection: collection.to_string(),
                field: field.to_string(),
            })
    }

    /// The descriptor whose raw id field is `id_field` on `collection`.
    pub fn by_id_field(&self, collection: &str, id_field: &str) -> Option<&RelationDescriptor> {
        self.by_id_field
            .get(&(collection.to_string(), id_field.to_string()))
            .map(|idx| &self.descriptors[*idx])
    }

    /// All relations declared on `collection`, keyed by logical field.
    pub fn relations_of<'a, 'c>(
        &'a self,
        collection: &'c str,
    ) -> impl Iterator<Item = &'a RelationDescriptor> + 'c
    where
        'a: 'c,
    {
        self.by_field
            .iter()
            .filter(move |((c, _), _)| c == collection)
            .map(|(_, idx)| &self.descriptors[*idx])
    }

    /// The reverse descriptor of `descriptor`.
    ///
    /// For a generic descriptor every candidate shares the same reverse descriptor, so the
    /// first candidate is representative.
    pub fn pair_of(&self, descriptor: &RelationDescriptor) -> Option<&RelationDescriptor> {
        let pair_field = descriptor.pair_field.as_deref()?;
        descriptor
            .foreign
            .collections()
            .into_iter()
            .find_map(|foreign| self.get(foreign, pair_field))
    }

    pub fn collections(&self) -> BTreeSet<&str> {
        self.descriptors
            .iter()
            .flat_map(|d| {
                d.own_collections
                    .iter()
                    .map(String::as_str)
                    .chain(d.foreign.collections())
            })
            .collect()
    }

    /// How wire values of `collection.field` are decoded.
    pub fn decoding(&self, collection: &str, field: &str) -> Decoding {
        match self.by_id_field(collection, field) {
            Some(d) if d.is_generic() => Decoding::Fqid,
            _ => Decoding::Plain,
        }
    }

    /// Match a concrete wire field name (`group_$7_ids`) against the structured id fields of
    /// `collection`.
    pub fn match_structured(&self, collection: &str, field: &str) -> Option<(&FieldTemplate, Id)> {
        if !field.contains(TEMPLATE_PLACEHOLDER) {
            return None;
        }
        self.relations_of(collection)
            .filter_map(|d| match &d.own_id_field {
                IdField::Structured(template) => Some(template),
                IdField::Plain(_) => None,
            })
            .find_map(|template| template.owner_of(field).map(|owner| (template, owner)))
    }

    /// Every `(collection, stored id field)` that the reverse index maintains.
    pub fn indexed_fields(&self) -> BTreeSet<(String, String)> {
        self.by_id_field.keys().cloned().collect()
    }
}
