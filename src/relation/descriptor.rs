use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{key::Id, GraphError};

/// Placeholder marking the owner id inside a structured field template.
pub const TEMPLATE_PLACEHOLDER: char = '$';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    pub fn is_many(&self) -> bool {
        matches!(self, Cardinality::Many)
    }

    pub fn complement(&self) -> Cardinality {
        match self {
            Cardinality::One => Cardinality::Many,
            Cardinality::Many => Cardinality::One,
        }
    }
}

/// The collection(s) on the other end of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Foreign {
    Collection(String),
    /// Closed candidate set of a generic relation. The id field holds fully-qualified ids.
    Candidates(Vec<String>),
}

impl Foreign {
    pub fn collections(&self) -> Vec<&str> {
        match self {
            Foreign::Collection(c) => vec![c.as_str()],
            Foreign::Candidates(cs) => cs.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, collection: &str) -> bool {
        match self {
            Foreign::Collection(c) => c == collection,
            Foreign::Candidates(cs) => cs.iter().any(|c| c == collection),
        }
    }
}

/// A structured field name split around its owner placeholder: `group_$_ids` becomes
/// prefix `group_` and suffix `_ids`. Concrete names are `group_$7_ids`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldTemplate {
    prefix: String,
    suffix: String,
}

impl FieldTemplate {
    pub fn parse(template: &str) -> Result<FieldTemplate, GraphError> {
        let Some((prefix, suffix)) = template.split_once(TEMPLATE_PLACEHOLDER) else {
            return Err(GraphError::InvalidRegistry(format!(
                "structured field template '{template}' has no '{TEMPLATE_PLACEHOLDER}' placeholder"
            )));
        };
        if suffix.contains(TEMPLATE_PLACEHOLDER) {
            return Err(GraphError::InvalidRegistry(format!(
                "structured field template '{template}' has more than one placeholder"
            )));
        }
        if prefix.is_empty() {
            return Err(GraphError::InvalidRegistry(format!(
                "structured field template '{template}' has an empty prefix"
            )));
        }
        Ok(FieldTemplate {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// The field name under which the folded per-owner map is stored.
    pub fn template(&self) -> String {
        format!("{}{TEMPLATE_PLACEHOLDER}{}", self.prefix, self.suffix)
    }

    /// The concrete wire field name for `owner`.
    pub fn concrete(&self, owner: Id) -> String {
        format!("{}{TEMPLATE_PLACEHOLDER}{owner}{}", self.prefix, self.suffix)
    }

    /// Parse the owner id out of a concrete wire field name.
    pub fn owner_of(&self, field: &str) -> Option<Id> {
        let rest = field
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix(TEMPLATE_PLACEHOLDER)?
            .strip_suffix(self.suffix.as_str())?;
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    }
}

impl Display for FieldTemplate {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.template())
    }
}

/// The raw record field holding a relation's id(s).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdField {
    Plain(String),
    Structured(FieldTemplate),
}

impl IdField {
    /// The key under which the field is stored on a [crate::store::Record].
    pub fn key(&self) -> String {
        match self {
            IdField::Plain(name) => name.clone(),
            IdField::Structured(template) => template.template(),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, IdField::Structured(_))
    }

    /// The name of the field on the wire, as requested upstream.
    pub fn wire_name(&self, owner: Option<Id>) -> String {
        match (self, owner) {
            (IdField::Structured(template), Some(owner)) => template.concrete(owner),
            _ => self.key(),
        }
    }
}

impl Display for IdField {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One direction of a relation between collections.
///
/// Descriptors are produced in matching pairs by the factories in
/// [crate::relation::factory]; [crate::relation::RegistryBuilder::build] checks that every
/// descriptor can find its pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Collections this side applies to. More than one only for the reverse side of a generic
    /// relation.
    pub own_collections: Vec<String>,
    pub foreign: Foreign,
    /// Logical relation name exposed on view models.
    pub own_field: String,
    pub own_id_field: IdField,
    pub cardinality: Cardinality,
    /// `own_field` of the paired descriptor on the foreign side.
    pub pair_field: Option<String>,
    /// Field of the related records to sort a many-relation by.
    pub order: Option<String>,
    pub is_full_list: bool,
    pub is_exclusive_list: bool,
    /// Name of the [crate::hydrate::ResolveContext] attribute that supplies the owner id of a
    /// structured relation when none is given explicitly.
    pub owner_attribute: Option<String>,
}

impl RelationDescriptor {
    pub fn is_generic(&self) -> bool {
        matches!(self.foreign, Foreign::Candidates(_))
    }

    pub fn is_structured(&self) -> bool {
        self.own_id_field.is_structured()
    }

    pub fn is_many(&self) -> bool {
        self.cardinality.is_many()
    }

    pub fn applies_to(&self, collection: &str) -> bool {
        self.own_collections.iter().any(|c| c == collection)
    }
}

impl Display for RelationDescriptor {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}.{} ({}) -[{:?}]-> {}",
            self.own_collections.join("|"),
            self.own_field,
            self.own_id_field,
            self.cardinality,
            self.foreign.collections().join("|")
        )
    }
}
