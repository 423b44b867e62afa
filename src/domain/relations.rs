use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::{
    domain::{
        AGENDA_ITEM, ASSIGNMENT, GROUP, LIST_OF_SPEAKERS, MEETING, MOTION, MOTION_BLOCK,
        PERSONAL_NOTE, PROJECTOR, TAG, TOPIC, USER,
    },
    relation::{
        make_generic_m2m, make_generic_o2m, make_generic_o2o, make_m2m, make_m2o, make_o2o,
        make_structured_m2m, make_structured_m2o, GenericM2M, GenericO2M, GenericO2O, Registry,
        StructuredM2M, StructuredM2O, M2M, M2O, O2O,
    },
    GraphError,
};

/// Context attribute holding the meeting that structured user relations default to.
pub const ACTIVE_MEETING: &str = "active_meeting_id";

/// Collections that can own an agenda item.
pub const AGENDA_ITEM_CONTENT: &[&str] = &[ASSIGNMENT, MOTION, MOTION_BLOCK, TOPIC];
/// Collections that can own a list of speakers.
pub const LIST_OF_SPEAKERS_CONTENT: &[&str] = &[ASSIGNMENT, MOTION, MOTION_BLOCK, TOPIC];
/// Collections that can carry tags.
pub const TAGGABLE: &[&str] = &[AGENDA_ITEM, ASSIGNMENT, MOTION, TOPIC];
/// Collections personal notes can be attached to.
pub const PERSONAL_NOTE_CONTENT: &[&str] = &[MOTION];

static REGISTRY: Lazy<Result<Arc<Registry>, GraphError>> =
    Lazy::new(|| build_registry().map(Arc::new));

/// The relation table of the meeting application, built once.
pub fn registry() -> Result<Arc<Registry>, GraphError> {
    REGISTRY.clone()
}

fn meeting_owns(many: &'static str, one_field: &'static str, order: Option<&'static str>) -> M2O<'static> {
    M2O {
        one: MEETING,
        many,
        one_field,
        many_field: "meeting",
        order,
        is_full_list: true,
        is_exclusive_list: true,
        ..Default::default()
    }
}

pub fn build_registry() -> Result<Registry, GraphError> {
    Registry::builder()
        .add(make_m2o(M2O {
            one_id_field: Some("motion_ids"),
            ..meeting_owns(MOTION, "motions", Some("sort_weight"))
        }))
        .add(make_m2o(M2O {
            one_id_field: Some("agenda_item_ids"),
            ..meeting_owns(AGENDA_ITEM, "agenda_items", Some("weight"))
        }))
        .add(make_m2o(M2O {
            one_id_field: Some("group_ids"),
            ..meeting_owns(GROUP, "groups", Some("weight"))
        }))
        .add(make_m2o(M2O {
            one_id_field: Some("projector_ids"),
            ..meeting_owns(PROJECTOR, "projectors", None)
        }))
        .add(make_m2o(M2O {
            one_id_field: Some("topic_ids"),
            ..meeting_owns(TOPIC, "topics", None)
        }))
        .add(make_m2o(M2O {
            one_id_field: Some("assignment_ids"),
            ..meeting_owns(ASSIGNMENT, "assignments", None)
        }))
        .add(make_m2o(M2O {
            one_id_field: Some("tag_ids"),
            ..meeting_owns(TAG, "tags", None)
        }))
        .add(make_m2o(M2O {
            one_id_field: Some("motion_block_ids"),
            ..meeting_owns(MOTION_BLOCK, "motion_blocks", None)
        }))
        .add(make_o2o(O2O {
            a: MEETING,
            b: PROJECTOR,
            a_field: "reference_projector",
            b_field: "used_as_reference_projector_meeting",
            ..Default::default()
        }))
        .add(make_m2o(M2O {
            one: MOTION,
            many: MOTION,
            one_field: "amendments",
            many_field: "lead_motion",
            one_id_field: Some("amendment_ids"),
            order: Some("number"),
            ..Default::default()
        }))
        .add(make_m2o(M2O {
            one: MOTION_BLOCK,
            many: MOTION,
            one_field: "motions",
            many_field: "block",
            one_id_field: Some("motion_ids"),
            order: Some("sort_weight"),
            ..Default::default()
        }))
        .add(make_m2m(M2M {
            a: MOTION,
            b: USER,
            a_field: "supporters",
            b_field: "supported_motions",
            a_id_field: Some("supporter_ids"),
            b_id_field: Some("supported_motion_ids"),
            ..Default::default()
        }))
        .add(make_generic_o2o(GenericO2O {
            owner: AGENDA_ITEM,
            owner_field: "content_object",
            candidates: AGENDA_ITEM_CONTENT,
            candidate_field: "agenda_item",
            ..Default::default()
        }))
        .add(make_generic_o2o(GenericO2O {
            owner: LIST_OF_SPEAKERS,
            owner_field: "content_object",
            candidates: LIST_OF_SPEAKERS_CONTENT,
            candidate_field: "list_of_speakers",
            ..Default::default()
        }))
        .add(make_generic_m2m(GenericM2M {
            owner: TAG,
            owner_field: "tagged",
            candidates: TAGGABLE,
            candidate_field: "tags",
            candidate_id_field: Some("tag_ids"),
            ..Default::default()
        }))
        .add(make_generic_o2m(GenericO2M {
            owner: PERSONAL_NOTE,
            owner_field: "content_object",
            candidates: PERSONAL_NOTE_CONTENT,
            candidate_field: "personal_notes",
            candidate_id_field: Some("personal_note_ids"),
            ..Default::default()
        }))
        .add(make_structured_m2m(StructuredM2M {
            structured: USER,
            structured_field: "groups",
            structured_id_template: Some("group_$_ids"),
            plain: GROUP,
            plain_field: "users",
            plain_id_field: Some("user_ids"),
            owner_attribute: ACTIVE_MEETING,
            order: None,
        }))
        .add(make_structured_m2o(StructuredM2O {
            one: USER,
            many: USER,
            one_field: "vote_delegations_from",
            many_field: "vote_delegated_to",
            one_id_template: Some("vote_delegations_$_from_ids"),
            many_id_template: Some("vote_delegated_$_to_id"),
            owner_attribute: ACTIVE_MEETING,
            order: None,
        }))
        .build()
}
