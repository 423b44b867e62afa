//! Domain module: the meeting application's collections, relation table and typed views.
//!
//! Every relation is declared through the [crate::relation::factory] functions in
//! [`relations`]. Typed views such as [ViewMeeting] wrap a [crate::hydrate::ViewModel];
//! generic relations resolve into [AnyView], and the candidate collections of each generic
//! relation share a capability trait ([HasAgendaItem], [HasListOfSpeakers], [Taggable],
//! [HasPersonalNotes]).

mod markers;
mod relations;
mod views;

use crate::{config::GraphConfig, store::Store, GraphError};

pub use markers::{AnyView, HasAgendaItem, HasListOfSpeakers, HasPersonalNotes, Taggable};
pub use relations::{
    build_registry, registry, ACTIVE_MEETING, AGENDA_ITEM_CONTENT, LIST_OF_SPEAKERS_CONTENT,
    PERSONAL_NOTE_CONTENT, TAGGABLE,
};
pub use views::{
    ViewAgendaItem, ViewAssignment, ViewGroup, ViewListOfSpeakers, ViewMeeting, ViewMotion,
    ViewMotionBlock, ViewPersonalNote, ViewProjector, ViewTag, ViewTopic, ViewUser,
};

pub const MEETING: &str = "meeting";
pub const MOTION: &str = "motion";
pub const MOTION_BLOCK: &str = "motion_block";
pub const USER: &str = "user";
pub const GROUP: &str = "group";
pub const TAG: &str = "tag";
pub const AGENDA_ITEM: &str = "agenda_item";
pub const TOPIC: &str = "topic";
pub const ASSIGNMENT: &str = "assignment";
pub const LIST_OF_SPEAKERS: &str = "list_of_speakers";
pub const PERSONAL_NOTE: &str = "personal_note";
pub const PROJECTOR: &str = "projector";

pub const COLLECTIONS: &[&str] = &[
    MEETING,
    MOTION,
    MOTION_BLOCK,
    USER,
    GROUP,
    TAG,
    AGENDA_ITEM,
    TOPIC,
    ASSIGNMENT,
    LIST_OF_SPEAKERS,
    PERSONAL_NOTE,
    PROJECTOR,
];

/// An empty store over the domain relation table.
pub fn new_store(config: &GraphConfig) -> Result<Store, GraphError> {
    Ok(Store::with_config(registry()?, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event::DeltaBatch, hydrate::Hydrator};
    use serde_json::json;
    use test_log::test;

    #[test]
    fn test_every_collection_has_a_view() {
        let mut store = new_store(&GraphConfig::default()).unwrap();
        let batch = COLLECTIONS
            .iter()
            .fold(DeltaBatch::new(), |batch, c| batch.update(c, 1, json!({})));
        store.apply(batch).unwrap();

        let hydrator = Hydrator::new(&store);
        for collection in COLLECTIONS {
            let view = hydrator.view_in(collection, 1).unwrap();
            let any = AnyView::from_view(view).unwrap();
            assert_eq!(any.fqid().collection, *collection);

            assert_eq!(
                any.as_agenda_content().is_some(),
                AGENDA_ITEM_CONTENT.contains(collection)
            );
            assert_eq!(
                any.as_speakers_content().is_some(),
                LIST_OF_SPEAKERS_CONTENT.contains(collection)
            );
            assert_eq!(any.as_taggable().is_some(), TAGGABLE.contains(collection));
            assert_eq!(
                any.as_note_content().is_some(),
                PERSONAL_NOTE_CONTENT.contains(collection)
            );
        }
        assert!(registry()
            .unwrap()
            .collections()
            .iter()
            .all(|c| COLLECTIONS.contains(c)));
    }
}
