//! Relation factories.
//!
//! Every factory emits both directions of a relation at once so that the forward and reverse
//! descriptors always agree on collections, field names and cardinality. Arguments are plain
//! structs; an empty string stands for a missing mandatory argument and is reported as
//! [GraphError::InvalidRegistry] when the registry is built.
//!
//! Unless overridden, id fields are named after the logical field: `{field}_id` for
//! single-valued sides and `{field}_ids` for many-valued sides.
use crate::{
    relation::descriptor::{Cardinality, FieldTemplate, Foreign, IdField, RelationDescriptor},
    GraphError,
};

/// Result of a factory: the matched descriptor pair, or the configuration error that stops
/// the registry from building.
pub type RelationPair = Result<Vec<RelationDescriptor>, GraphError>;

pub fn default_id_field(field: &str, cardinality: Cardinality) -> String {
    match cardinality {
        Cardinality::One => format!("{field}_id"),
        Cardinality::Many => format!("{field}_ids"),
    }
}

fn require(factory: &str, args: &[(&str, &str)]) -> Result<(), GraphError> {
    let missing = args
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(GraphError::InvalidRegistry(format!(
            "{factory} is missing mandatory argument(s): {}",
            missing.join(", ")
        )))
    }
}

fn plain_id(field: &str, explicit: Option<&str>, cardinality: Cardinality) -> IdField {
    IdField::Plain(
        explicit
            .map(str::to_string)
            .unwrap_or_else(|| default_id_field(field, cardinality)),
    )
}

fn structured_id(
    field: &str,
    explicit: Option<&str>,
    cardinality: Cardinality,
) -> Result<IdField, GraphError> {
    let template = match explicit {
        Some(template) => template.to_string(),
        None => match cardinality {
            Cardinality::One => format!("{field}_$_id"),
            Cardinality::Many => format!("{field}_$_ids"),
        },
    };
    Ok(IdField::Structured(FieldTemplate::parse(&template)?))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn descriptor(
    own_collections: Vec<String>,
    foreign: Foreign,
    own_field: &str,
    own_id_field: IdField,
    cardinality: Cardinality,
    pair_field: &str,
    order: Option<&str>,
    owner_attribute: Option<&str>,
) -> RelationDescriptor {
    RelationDescriptor {
        own_collections,
        foreign,
        own_field: own_field.to_string(),
        own_id_field,
        cardinality,
        pair_field: Some(pair_field.to_string()),
        order: order.map(str::to_string),
        is_full_list: false,
        is_exclusive_list: false,
        owner_attribute: owner_attribute.map(str::to_string),
    }
}

/// One-to-one between `a` and `b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct O2O<'a> {
    pub a: &'a str,
    pub b: &'a str,
    /// Field on `a` pointing to `b`.
    pub a_field: &'a str,
    /// Field on `b` pointing to `a`.
    pub b_field: &'a str,
    pub a_id_field: Option<&'a str>,
    pub b_id_field: Option<&'a str>,
}

pub fn make_o2o(args: O2O) -> RelationPair {
    require(
        "make_o2o",
        &[
            ("a", args.a),
            ("b", args.b),
            ("a_field", args.a_field),
            ("b_field", args.b_field),
        ],
    )?;
    Ok(vec![
        descriptor(
            vec![args.a.to_string()],
            Foreign::Collection(args.b.to_string()),
            args.a_field,
            plain_id(args.a_field, args.a_id_field, Cardinality::One),
            Cardinality::One,
            args.b_field,
            None,
            None,
        ),
        descriptor(
            vec![args.b.to_string()],
            Foreign::Collection(args.a.to_string()),
            args.b_field,
            plain_id(args.b_field, args.b_id_field, Cardinality::One),
            Cardinality::One,
            args.a_field,
            None,
            None,
        ),
    ])
}

/// Many-to-one: every `many` record points to one `one` record, which lists its `many`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct M2O<'a> {
    pub one: &'a str,
    pub many: &'a str,
    /// Many-valued field on `one` (e.g. `motions`).
    pub one_field: &'a str,
    /// Single-valued field on `many` (e.g. `meeting`).
    pub many_field: &'a str,
    pub one_id_field: Option<&'a str>,
    pub many_id_field: Option<&'a str>,
    /// Sort key for the many-valued side.
    pub order: Option<&'a str>,
    pub is_full_list: bool,
    pub is_exclusive_list: bool,
}

pub fn make_m2o(args: M2O) -> RelationPair {
    require(
        "make_m2o",
        &[
            ("one", args.one),
            ("many", args.many),
            ("one_field", args.one_field),
            ("many_field", args.many_field),
        ],
    )?;
    let mut to_many = descriptor(
        vec![args.one.to_string()],
        Foreign::Collection(args.many.to_string()),
        args.one_field,
        plain_id(args.one_field, args.one_id_field, Cardinality::Many),
        Cardinality::Many,
        args.many_field,
        args.order,
        None,
    );
    to_many.is_full_list = args.is_full_list;
    to_many.is_exclusive_list = args.is_exclusive_list;
    Ok(vec![
        descriptor(
            vec![args.many.to_string()],
            Foreign::Collection(args.one.to_string()),
            args.many_field,
            plain_id(args.many_field, args.many_id_field, Cardinality::One),
            Cardinality::One,
            args.one_field,
            None,
            None,
        ),
        to_many,
    ])
}

/// Many-to-many between `a` and `b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct M2M<'a> {
    pub a: &'a str,
    pub b: &'a str,
    pub a_field: &'a str,
    pub b_field: &'a str,
    pub a_id_field: Option<&'a str>,
    pub b_id_field: Option<&'a str>,
    pub a_order: Option<&'a str>,
    pub b_order: Option<&'a str>,
}

pub fn make_m2m(args: M2M) -> RelationPair {
    require(
        "make_m2m",
        &[
            ("a", args.a),
            ("b", args.b),
            ("a_field", args.a_field),
            ("b_field", args.b_field),
        ],
    )?;
    Ok(vec![
        descriptor(
            vec![args.a.to_string()],
            Foreign::Collection(args.b.to_string()),
            args.a_field,
            plain_id(args.a_field, args.a_id_field, Cardinality::Many),
            Cardinality::Many,
            args.b_field,
            args.a_order,
            None,
        ),
        descriptor(
            vec![args.b.to_string()],
            Foreign::Collection(args.a.to_string()),
            args.b_field,
            plain_id(args.b_field, args.b_id_field, Cardinality::Many),
            Cardinality::Many,
            args.a_field,
            args.b_order,
            None,
        ),
    ])
}

/// Generic one-to-one: `owner.owner_field` holds the fqid of exactly one candidate, and each
/// candidate points back with a plain single id.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericO2O<'a> {
    pub owner: &'a str,
    pub owner_field: &'a str,
    pub owner_id_field: Option<&'a str>,
    pub candidates: &'a [&'a str],
    pub candidate_field: &'a str,
    pub candidate_id_field: Option<&'a str>,
}

pub fn make_generic_o2o(args: GenericO2O) -> RelationPair {
    require(
        "make_generic_o2o",
        &[
            ("owner", args.owner),
            ("owner_field", args.owner_field),
            ("candidate_field", args.candidate_field),
        ],
    )?;
    require_candidates("make_generic_o2o", args.candidates)?;
    Ok(generic_pair(
        args.owner,
        args.owner_field,
        plain_id(args.owner_field, args.owner_id_field, Cardinality::One),
        Cardinality::One,
        args.candidates,
        args.candidate_field,
        plain_id(
            args.candidate_field,
            args.candidate_id_field,
            Cardinality::One,
        ),
        Cardinality::One,
        None,
    ))
}

/// Generic one-to-many: many `owner` records each hold the fqid of one candidate, and each
/// candidate lists its owners.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericO2M<'a> {
    pub owner: &'a str,
    pub owner_field: &'a str,
    pub owner_id_field: Option<&'a str>,
    pub candidates: &'a [&'a str],
    pub candidate_field: &'a str,
    pub candidate_id_field: Option<&'a str>,
    pub order: Option<&'a str>,
}

pub fn make_generic_o2m(args: GenericO2M) -> RelationPair {
    require(
        "make_generic_o2m",
        &[
            ("owner", args.owner),
            ("owner_field", args.owner_field),
            ("candidate_field", args.candidate_field),
        ],
    )?;
    require_candidates("make_generic_o2m", args.candidates)?;
    Ok(generic_pair(
        args.owner,
        args.owner_field,
        plain_id(args.owner_field, args.owner_id_field, Cardinality::One),
        Cardinality::One,
        args.candidates,
        args.candidate_field,
        plain_id(
            args.candidate_field,
            args.candidate_id_field,
            Cardinality::Many,
        ),
        Cardinality::Many,
        args.order,
    ))
}

/// Generic many-to-many: `owner.owner_field` lists fqids of candidates, and each candidate
/// lists its owners.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericM2M<'a> {
    pub owner: &'a str,
    pub owner_field: &'a str,
    pub owner_id_field: Option<&'a str>,
    pub candidates: &'a [&'a str],
    pub candidate_field: &'a str,
    pub candidate_id_field: Option<&'a str>,
    pub order: Option<&'a str>,
}

pub fn make_generic_m2m(args: GenericM2M) -> RelationPair {
    require(
        "make_generic_m2m",
        &[
            ("owner", args.owner),
            ("owner_field", args.owner_field),
            ("candidate_field", args.candidate_field),
        ],
    )?;
    require_candidates("make_generic_m2m", args.candidates)?;
    Ok(generic_pair(
        args.owner,
        args.owner_field,
        plain_id(args.owner_field, args.owner_id_field, Cardinality::Many),
        Cardinality::Many,
        args.candidates,
        args.candidate_field,
        plain_id(
            args.candidate_field,
            args.candidate_id_field,
            Cardinality::Many,
        ),
        Cardinality::Many,
        args.order,
    ))
}

fn require_candidates(factory: &str, candidates: &[&str]) -> Result<(), GraphError> {
    if candidates.is_empty() || candidates.iter().any(|c| c.trim().is_empty()) {
        return Err(GraphError::InvalidRegistry(format!(
            "{factory} needs a non-empty candidate set without blank names"
        )));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn generic_pair(
    owner: &str,
    owner_field: &str,
    owner_id_field: IdField,
    owner_cardinality: Cardinality,
    candidates: &[&str],
    candidate_field: &str,
    candidate_id_field: IdField,
    candidate_cardinality: Cardinality,
    order: Option<&str>,
) -> Vec<RelationDescriptor> {
    vec![
        descriptor(
            vec![owner.to_string()],
            Foreign::Candidates(strings(candidates)),
            owner_field,
            owner_id_field,
            owner_cardinality,
            candidate_field,
            None,
            None,
        ),
        descriptor(
            strings(candidates),
            Foreign::Collection(owner.to_string()),
            candidate_field,
            candidate_id_field,
            candidate_cardinality,
            owner_field,
            order,
            None,
        ),
    ]
}

/// Many-to-many where one side keeps a separate id list per owner, e.g. a user's groups per
/// meeting (`group_$_ids`). The plain side lists all its members regardless of owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredM2M<'a> {
    pub structured: &'a str,
    pub structured_field: &'a str,
    /// Template with a single `$` placeholder for the owner id.
    pub structured_id_template: Option<&'a str>,
    pub plain: &'a str,
    pub plain_field: &'a str,
    pub plain_id_field: Option<&'a str>,
    /// [crate::hydrate::ResolveContext] attribute supplying the default owner.
    pub owner_attribute: &'a str,
    pub order: Option<&'a str>,
}

pub fn make_structured_m2m(args: StructuredM2M) -> RelationPair {
    require(
        "make_structured_m2m",
        &[
            ("structured", args.structured),
            ("structured_field", args.structured_field),
            ("plain", args.plain),
            ("plain_field", args.plain_field),
            ("owner_attribute", args.owner_attribute),
        ],
    )?;
    Ok(vec![
        descriptor(
            vec![args.structured.to_string()],
            Foreign::Collection(args.plain.to_string()),
            args.structured_field,
            structured_id(
                args.structured_field,
                args.structured_id_template,
                Cardinality::Many,
            )?,
            Cardinality::Many,
            args.plain_field,
            args.order,
            Some(args.owner_attribute),
        ),
        descriptor(
            vec![args.plain.to_string()],
            Foreign::Collection(args.structured.to_string()),
            args.plain_field,
            plain_id(args.plain_field, args.plain_id_field, Cardinality::Many),
            Cardinality::Many,
            args.structured_field,
            None,
            None,
        ),
    ])
}

/// Many-to-one where both sides are kept per owner, e.g. vote delegations between users of one
/// meeting (`vote_delegated_$_to_id` and `vote_delegations_$_from_ids`).
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredM2O<'a> {
    pub one: &'a str,
    pub many: &'a str,
    pub one_field: &'a str,
    pub many_field: &'a str,
    pub one_id_template: Option<&'a str>,
    pub many_id_template: Option<&'a str>,
    pub owner_attribute: &'a str,
    pub order: Option<&'a str>,
}

pub fn make_structured_m2o(args: StructuredM2O) -> RelationPair {
    require(
        "make_structured_m2o",
        &[
            ("one", args.one),
            ("many", args.many),
            ("one_field", args.one_field),
            ("many_field", args.many_field),
            ("owner_attribute", args.owner_attribute),
        ],
    )?;
    Ok(vec![
        descriptor(
            vec![args.many.to_string()],
            Foreign::Collection(args.one.to_string()),
            args.many_field,
            structured_id(args.many_field, args.many_id_template, Cardinality::One)?,
            Cardinality::One,
            args.one_field,
            None,
            Some(args.owner_attribute),
        ),
        descriptor(
            vec![args.one.to_string()],
            Foreign::Collection(args.many.to_string()),
            args.one_field,
            structured_id(args.one_field, args.one_id_template, Cardinality::Many)?,
            Cardinality::Many,
            args.many_field,
            args.order,
            Some(args.owner_attribute),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn collection_set<'a>(names: impl IntoIterator<Item = &'a str>) -> BTreeSet<&'a str> {
        names.into_iter().collect()
    }

    #[test]
    fn test_every_factory_emits_complementary_pair() {
        use Cardinality::{Many, One};

        let pairs: Vec<(&str, RelationPair, (Cardinality, Cardinality))> = vec![
            (
                "o2o",
                make_o2o(O2O {
                    a: "meeting",
                    b: "projector",
                    a_field: "reference_projector",
                    b_field: "used_as_reference_projector_meeting",
                    ..Default::default()
                }),
                (One, One),
            ),
            (
                "m2o",
                make_m2o(M2O {
                    one: "meeting",
                    many: "motion",
                    one_field: "motions",
                    many_field: "meeting",
                    ..Default::default()
                }),
                (One, Many),
            ),
            (
                "m2m",
                make_m2m(M2M {
                    a: "motion",
                    b: "user",
                    a_field: "supporters",
                    b_field: "supported_motions",
                    ..Default::default()
                }),
                (Many, Many),
            ),
            (
                "generic o2o",
                make_generic_o2o(GenericO2O {
                    owner: "agenda_item",
                    owner_field: "content_object",
                    candidates: &["motion", "topic"],
                    candidate_field: "agenda_item",
                    ..Default::default()
                }),
                (One, One),
            ),
            (
                "generic o2m",
                make_generic_o2m(GenericO2M {
                    owner: "personal_note",
                    owner_field: "content_object",
                    candidates: &["motion", "topic"],
                    candidate_field: "personal_notes",
                    ..Default::default()
                }),
                (One, Many),
            ),
            (
                "generic m2m",
                make_generic_m2m(GenericM2M {
                    owner: "tag",
                    owner_field: "tagged",
                    candidates: &["motion", "topic", "assignment"],
                    candidate_field: "tags",
                    ..Default::default()
                }),
                (Many, Many),
            ),
            (
                "structured m2m",
                make_structured_m2m(StructuredM2M {
                    structured: "user",
                    structured_field: "groups",
                    plain: "group",
                    plain_field: "users",
                    owner_attribute: "active_meeting_id",
                    ..Default::default()
                }),
                (Many, Many),
            ),
            (
                "structured m2o",
                make_structured_m2o(StructuredM2O {
                    one: "user",
                    many: "user",
                    one_field: "vote_delegations_from",
                    many_field: "vote_delegated_to",
                    owner_attribute: "active_meeting_id",
                    ..Default::default()
                }),
                (One, Many),
            ),
        ];

        for (name, pair, (first, second)) in pairs {
            let pair = pair.unwrap_or_else(|e| panic!("{name}: {e}"));
            let [lhs, rhs] = &pair[..] else {
                panic!("{name} emitted {} descriptors", pair.len());
            };
            assert_eq!((lhs.cardinality, rhs.cardinality), (first, second), "{name}");
            assert_eq!(
                collection_set(lhs.foreign.collections()),
                collection_set(rhs.own_collections.iter().map(String::as_str)),
                "{name}: forward side must reach every reverse collection"
            );
            assert_eq!(
                collection_set(rhs.foreign.collections()),
                collection_set(lhs.own_collections.iter().map(String::as_str)),
                "{name}: reverse side must reach every forward collection"
            );
            assert_eq!(lhs.pair_field.as_deref(), Some(rhs.own_field.as_str()), "{name}");
            assert_eq!(rhs.pair_field.as_deref(), Some(lhs.own_field.as_str()), "{name}");
        }
    }

    #[test]
    fn test_m2o_emits_complementary_pair() {
        let pair = make_m2o(M2O {
            one: "meeting",
            many: "motion",
            one_field: "motions",
            many_field: "meeting",
            order: Some("sort_weight"),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(pair.len(), 2);
        let many = pair.iter().filter(|d| d.is_many()).collect::<Vec<_>>();
        let one = pair.iter().filter(|d| !d.is_many()).collect::<Vec<_>>();
        assert_eq!((many.len(), one.len()), (1, 1));

        assert_eq!(one[0].own_collections, vec!["motion".to_string()]);
        assert_eq!(one[0].own_id_field, IdField::Plain("meeting_id".into()));
        assert_eq!(one[0].pair_field.as_deref(), Some("motions"));

        assert_eq!(many[0].own_collections, vec!["meeting".to_string()]);
        assert_eq!(many[0].own_id_field, IdField::Plain("motions_ids".into()));
        assert_eq!(many[0].order.as_deref(), Some("sort_weight"));
        assert_eq!(many[0].foreign, Foreign::Collection("motion".into()));
    }

    #[test]
    fn test_missing_argument_is_a_configuration_error() {
        let err = make_m2m(M2M {
            a: "motion",
            b: "user",
            a_field: "supporters",
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("b_field"));
    }

    #[test]
    fn test_generic_pair_spans_candidates() {
        let pair = make_generic_m2m(GenericM2M {
            owner: "tag",
            owner_field: "tagged",
            candidates: &["motion", "assignment"],
            candidate_field: "tags",
            ..Default::default()
        })
        .unwrap();

        assert!(pair[0].is_generic());
        assert_eq!(pair[0].own_id_field.key(), "tagged_ids");
        assert!(!pair[1].is_generic());
        assert!(pair[1].applies_to("motion") && pair[1].applies_to("assignment"));
        assert_eq!(pair[1].foreign, Foreign::Collection("tag".into()));

        assert!(make_generic_o2o(GenericO2O {
            owner: "agenda_item",
            owner_field: "content_object",
            candidates: &[],
            candidate_field: "agenda_item",
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_structured_defaults_and_templates() {
        let pair = make_structured_m2m(StructuredM2M {
            structured: "user",
            structured_field: "groups",
            structured_id_template: Some("group_$_ids"),
            plain: "group",
            plain_field: "users",
            plain_id_field: Some("user_ids"),
            owner_attribute: "active_meeting_id",
            order: None,
        })
        .unwrap();
        assert!(pair[0].is_structured());
        assert_eq!(pair[0].own_id_field.wire_name(Some(4)), "group_$4_ids");
        assert_eq!(pair[0].owner_attribute.as_deref(), Some("active_meeting_id"));
        assert!(!pair[1].is_structured());

        let pair = make_structured_m2o(StructuredM2O {
            one: "user",
            many: "user",
            one_field: "vote_delegations_from",
            many_field: "vote_delegated_to",
            owner_attribute: "active_meeting_id",
            ..Default::default()
        })
        .unwrap();
        assert_eq!(pair[0].own_id_field.key(), "vote_delegated_to_$_id");
        assert_eq!(pair[1].own_id_field.key(), "vote_delegations_from_$_ids");

        assert!(make_structured_m2m(StructuredM2M {
            structured: "user",
            structured_field: "groups",
            structured_id_template: Some("group_ids"),
            plain: "group",
            plain_field: "users",
            owner_attribute: "active_meeting_id",
            ..Default::default()
        })
        .is_err());
    }
}
