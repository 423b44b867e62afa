//! Integration tests for follow-tree merging and request pooling.

mod common;

use common::init_logging;
use meetgraph_core::{
    domain::{self, MEETING},
    request::{
        merge_follow, Fieldset, Follow, FollowEntry, ModelRequest, ModelRequestBuilder,
        RequestPool, SubscriptionSink, DETAIL, LIST,
    },
    GraphError,
};
use serde_json::json;
use test_log::test;

fn follow(value: serde_json::Value) -> Follow {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_merge_with_itself_requests_the_same_data() {
    init_logging();
    let tree = follow(json!({
        "idField": "meeting",
        "fieldset": "detail",
        "follow": [
            "projector_ids",
            {"idField": "motion_ids", "fieldset": ["title", "number"], "follow": ["tag_ids"]}
        ]
    }));
    let merged = merge_follow(&tree, &tree).unwrap();
    assert_eq!(merged.requested(), tree.requested());
    assert_eq!(merged, tree);
}

#[test]
fn test_nested_follows_are_unioned() {
    init_logging();
    let lhs = follow(json!({
        "idField": "meeting",
        "follow": [{"idField": "motion_ids", "follow": ["p"]}]
    }));
    let rhs = follow(json!({
        "idField": "meeting",
        "follow": [{"idField": "motion_ids", "follow": ["q"]}, "topic_ids"]
    }));
    let merged = merge_follow(&lhs, &rhs).unwrap();

    let requested = merged.requested();
    for path in ["motion_ids", "motion_ids.p", "motion_ids.q", "topic_ids"] {
        assert!(requested.contains(path), "missing {path}");
    }
    assert_eq!(merged.follow[1], FollowEntry::IdField("topic_ids".into()));
    assert_eq!(
        serde_json::to_value(&merged).unwrap(),
        json!({
            "idField": "meeting",
            "follow": [{"idField": "motion_ids", "follow": ["p", "q"]}, "topic_ids"]
        })
    );
}

#[test]
fn test_differing_presets_conflict() {
    init_logging();
    let lhs = Follow::new("meeting").with_follow(Follow::new("motion_ids").with_fieldset(DETAIL));
    let rhs = Follow::new("meeting").with_follow(Follow::new("motion_ids").with_fieldset(LIST));
    match merge_follow(&lhs, &rhs) {
        Err(GraphError::FieldsetMismatch { id_field, .. }) => assert_eq!(id_field, "motion_ids"),
        other => panic!("expected a fieldset mismatch, got {other:?}"),
    }

    let fields = Follow::new("meeting").with_fieldset(&["name"][..]);
    let merged = merge_follow(&Follow::new("meeting").with_fieldset(LIST), &fields).unwrap();
    assert_eq!(
        merged.fieldset,
        Some(Fieldset::Fields(vec!["list".into(), "name".into()]))
    );
}

#[derive(Default)]
struct RecordingSink(Vec<ModelRequest>);

impl SubscriptionSink for RecordingSink {
    fn subscribe(&mut self, request: &ModelRequest) -> Result<(), GraphError> {
        self.0.push(request.clone());
        Ok(())
    }
}

#[test]
fn test_pool_folds_built_requests() {
    init_logging();
    let registry = domain::registry().unwrap();
    let motions = ModelRequestBuilder::new(&registry, MEETING, [1])
        .follow_with("motions", |motion| motion.fieldset(LIST).follow("tags"))
        .build()
        .unwrap();
    let projectors = ModelRequestBuilder::new(&registry, MEETING, [2])
        .follow("projectors")
        .build()
        .unwrap();
    let detail = ModelRequestBuilder::new(&registry, MEETING, [1])
        .follow_with("motions", |motion| motion.fieldset(DETAIL))
        .build()
        .unwrap();

    let mut pool = RequestPool::new();
    assert!(!pool.add(motions).unwrap());
    assert!(pool.add(projectors).unwrap());
    assert!(!pool.add(detail).unwrap());
    assert_eq!(pool.len(), 2);

    let mut sink = RecordingSink::default();
    assert_eq!(pool.flush(&mut sink).unwrap(), 2);
    assert!(pool.is_empty());

    let folded = &sink.0[0];
    assert_eq!(folded.ids, vec![1, 2]);
    let requested = folded.root().requested();
    for path in ["motion_ids", "motion_ids#list", "motion_ids.tag_ids", "projector_ids"] {
        assert!(requested.contains(path), "missing {path}");
    }
}

#[test]
fn test_builder_rejects_unknown_relations() {
    init_logging();
    let registry = domain::registry().unwrap();
    let result = ModelRequestBuilder::new(&registry, MEETING, [1])
        .follow("motions")
        .follow("no_such_relation")
        .build();
    assert!(matches!(result, Err(GraphError::UnknownRelation { .. })));
}
