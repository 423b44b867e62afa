//! End-to-end scenarios over the meeting relation table.
//!
//! Each test feeds delta batches into a store that cross-checks its reverse index after every
//! commit, then reads the result through typed views.

mod common;

use common::{init_logging, verified_store};
use meetgraph_core::{
    domain::{
        AnyView, HasAgendaItem, Taggable, ViewAgendaItem, ViewMeeting, ViewMotion, ViewProjector,
        ViewTag, ViewUser, ACTIVE_MEETING,
    },
    event::{DeltaBatch, Delta},
    hydrate::{Hydrator, RelationCache, ResolveContext},
    key::Fqid,
    GraphError,
};
use serde_json::json;
use test_log::test;

fn ids<'a, V: std::ops::Deref<Target = meetgraph_core::hydrate::ViewModel<'a>>>(
    views: &[V],
) -> Vec<u64> {
    views.iter().map(|v| v.id()).collect()
}

#[test]
fn test_meeting_motions_ordered_by_sort_weight() {
    init_logging();
    let mut store = verified_store();
    store
        .apply(
            DeltaBatch::new()
                .update("meeting", 1, json!({"name": "Plenary"}))
                .update("motion", 10, json!({"meeting_id": 1, "sort_weight": 5}))
                .update("motion", 11, json!({"meeting_id": 1, "sort_weight": 2}))
                .update("motion", 12, json!({"meeting_id": 1})),
        )
        .unwrap();

    let hydrator = Hydrator::new(&store);
    let meeting = hydrator.get::<ViewMeeting>(1).unwrap();
    assert_eq!(meeting.name(), Some("Plenary"));
    // Motion 12 has no sort weight and goes last.
    assert_eq!(ids(&meeting.motions()), vec![11, 10, 12]);
    assert_eq!(
        hydrator.get::<ViewMotion>(10).unwrap().meeting().map(|m| m.id()),
        Some(1)
    );
}

#[test]
fn test_moving_and_deleting_a_motion() {
    init_logging();
    let mut store = verified_store();
    store
        .apply(
            DeltaBatch::new()
                .update("meeting", 2, json!({}))
                .update("meeting", 3, json!({}))
                .update("motion", 5, json!({"meeting_id": 2})),
        )
        .unwrap();
    store
        .apply(DeltaBatch::new().update("motion", 5, json!({"meeting_id": 3})))
        .unwrap();

    {
        let hydrator = Hydrator::new(&store);
        assert!(hydrator.get::<ViewMeeting>(2).unwrap().motions().is_empty());
        assert_eq!(ids(&hydrator.get::<ViewMeeting>(3).unwrap().motions()), vec![5]);
    }

    let notice = store
        .apply(DeltaBatch::new().delete("motion", 5))
        .unwrap();
    assert!(notice.deleted.contains(&Fqid::new("motion", 5)));

    let hydrator = Hydrator::new(&store);
    assert!(hydrator.get::<ViewMotion>(5).is_none());
    assert!(hydrator.get::<ViewMeeting>(3).unwrap().motions().is_empty());
    assert!(store
        .referrers("motion", "meeting_id", &Fqid::new("meeting", 3), None)
        .is_empty());
}

#[test]
fn test_generic_content_object() {
    init_logging();
    let mut store = verified_store();
    store
        .apply(
            DeltaBatch::new()
                .update("topic", 4, json!({"title": "Budget"}))
                .update("user", 1, json!({"username": "ada"}))
                .update("agenda_item", 1, json!({"content_object_id": "topic/4"}))
                .update("agenda_item", 2, json!({"content_object_id": "user/1"})),
        )
        .unwrap();

    let hydrator = Hydrator::new(&store);
    let item = hydrator.get::<ViewAgendaItem>(1).unwrap();
    match item.content_object() {
        Some(AnyView::Topic(topic)) => {
            assert_eq!(topic.title(), Some("Budget"));
            assert_eq!(topic.agenda_item().map(|i| i.id()), Some(1));
        }
        other => panic!("expected topic/4, got {other:?}"),
    }

    // `user` is not a candidate collection of agenda items.
    let outside = hydrator.get::<ViewAgendaItem>(2).unwrap();
    assert!(outside.content_object().is_none());
}

#[test]
fn test_tags_across_candidate_collections() {
    init_logging();
    let mut store = verified_store();
    store
        .apply(
            DeltaBatch::new()
                .update("tag", 1, json!({"name": "urgent"}))
                .update("motion", 3, json!({"tag_ids": [1]}))
                .update("topic", 2, json!({"tag_ids": [1]})),
        )
        .unwrap();

    let hydrator = Hydrator::new(&store);
    let tag = hydrator.get::<ViewTag>(1).unwrap();
    let tagged = tag
        .tagged()
        .iter()
        .map(|v| v.fqid().to_string())
        .collect::<Vec<_>>();
    assert_eq!(tagged, vec!["topic/2", "motion/3"]);

    let motion = hydrator.get::<ViewMotion>(3).unwrap();
    assert_eq!(
        motion.tags().iter().map(|t| t.name()).collect::<Vec<_>>(),
        vec![Some("urgent")]
    );
}

#[test]
fn test_structured_groups_follow_the_active_meeting() {
    init_logging();
    let mut store = verified_store();
    store
        .apply(
            DeltaBatch::new()
                .update("group", 3, json!({"name": "Delegates", "meeting_id": 7}))
                .update("group", 4, json!({"name": "Staff", "meeting_id": 8}))
                .update("user", 1, json!({"group_$7_ids": [3], "group_$8_ids": [4]})),
        )
        .unwrap();

    let hydrator = Hydrator::new(&store).with_context(ResolveContext::new().with(ACTIVE_MEETING, 7));
    let user = hydrator.get::<ViewUser>(1).unwrap();
    assert_eq!(ids(&user.groups()), vec![3]);
    assert_eq!(ids(&user.groups_in(8)), vec![4]);
    assert_eq!(user.group_ids_in(8), vec![4]);

    let delegates = hydrator
        .view_in("group", 3)
        .and_then(|view| view.try_many("users", None).ok())
        .unwrap();
    assert_eq!(delegates.iter().map(|v| v.id()).collect::<Vec<_>>(), vec![1]);

    // Without an owner in context or in the call, structured relations are empty.
    let bare = Hydrator::new(&store);
    assert!(bare.get::<ViewUser>(1).unwrap().groups().is_empty());

    // Removing one owner's value leaves the other in place.
    store
        .apply(DeltaBatch::new().update("user", 1, json!({"group_$7_ids": null})))
        .unwrap();
    let hydrator = Hydrator::new(&store);
    let user = hydrator.get::<ViewUser>(1).unwrap();
    assert!(user.groups_in(7).is_empty());
    assert_eq!(ids(&user.groups_in(8)), vec![4]);
}

#[test]
fn test_commit_notice_after_batch() {
    init_logging();
    let mut store = verified_store();
    let mut rx = store.subscribe();
    store
        .apply(
            DeltaBatch::new()
                .update("meeting", 1, json!({}))
                .update("motion", 1, json!({"meeting_id": 1})),
        )
        .unwrap();
    store
        .apply(DeltaBatch::new().delete("motion", 1))
        .unwrap();

    let first = rx.try_recv().unwrap();
    assert_eq!(first.sequence, 1);
    assert!(first.touches(&Fqid::new("motion", 1)));
    assert!(first.touches_collection("meeting"));

    let second = rx.try_recv().unwrap();
    assert_eq!(second.sequence, 2);
    assert!(second.changed.is_empty());
    assert_eq!(second.deleted.len(), 1);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_projector_aspect_ratio_patch() {
    init_logging();
    let mut store = verified_store();
    store
        .apply(DeltaBatch::new().update("projector", 1, json!({"name": "Main"})))
        .unwrap();

    let patch = {
        let hydrator = Hydrator::new(&store);
        let projector = hydrator.get::<ViewProjector>(1).unwrap();
        assert!(matches!(
            projector.aspect_ratio_patch("wide"),
            Err(GraphError::MalformedValue { .. })
        ));
        projector.aspect_ratio_patch("16:9").unwrap()
    };
    assert!(matches!(patch, Delta::Update { .. }));
    store.apply(DeltaBatch(vec![patch])).unwrap();

    let hydrator = Hydrator::new(&store);
    assert_eq!(
        hydrator.get::<ViewProjector>(1).unwrap().aspect_ratio(),
        Some((16, 9))
    );
}

#[test]
fn test_cached_views_follow_new_commits() {
    init_logging();
    let mut store = verified_store();
    let cache = RelationCache::new();
    store
        .apply(
            DeltaBatch::new()
                .update("meeting", 1, json!({}))
                .update("motion", 1, json!({"meeting_id": 1})),
        )
        .unwrap();
    {
        let hydrator = Hydrator::from_config(&store, &cache);
        assert_eq!(ids(&hydrator.get::<ViewMeeting>(1).unwrap().motions()), vec![1]);
    }
    store
        .apply(DeltaBatch::new().update("motion", 2, json!({"meeting_id": 1})))
        .unwrap();
    let hydrator = Hydrator::from_config(&store, &cache);
    assert_eq!(ids(&hydrator.get::<ViewMeeting>(1).unwrap().motions()), vec![1, 2]);
}
