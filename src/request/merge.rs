//! Follow-tree merging.
//!
//! [merge_follow] combines two independently requested follow trees into one tree that serves
//! both. The merge is a recursive union:
//!
//! - **Fieldsets**: two differing presets conflict with [GraphError::FieldsetMismatch]. Equal
//!   presets stay a preset. Otherwise both sides are unioned in first-seen order without
//!   repeats, a preset counting as a one-element list.
//! - **Follow lists**: entries are matched by `idField`; a bare string matches the object form
//!   of the same id field. Matched entries are merged recursively, unmatched entries of the
//!   second tree are appended.
//! - The root keeps the first tree's `idField`.
use crate::{
    request::follow::{Fieldset, Follow, FollowEntry},
    GraphError,
};

pub fn merge_follow(lhs: &Follow, rhs: &Follow) -> Result<Follow, GraphError> {
    let mut merged = lhs.clone();
    merged.fieldset = merge_fieldsets(&lhs.id_field, lhs.fieldset.as_ref(), rhs.fieldset.as_ref())?;
    for entry in rhs.follow.iter() {
        insert_entry(&mut merged.follow, entry.clone().into_node())?;
    }
    Ok(merged)
}

/// Add `node` to a follow list, merging it into an entry with the same `idField` if there is
/// one.
pub fn insert_entry(follow: &mut Vec<FollowEntry>, node: Follow) -> Result<(), GraphError> {
    match follow.iter().position(|e| e.id_field() == node.id_field) {
        Some(idx) => {
            let existing = follow[idx].clone().into_node();
            follow[idx] = FollowEntry::from_node(merge_follow(&existing, &node)?);
        }
        None => follow.push(FollowEntry::from_node(node)),
    }
    Ok(())
}

pub fn merge_fieldsets(
    id_field: &str,
    lhs: Option<&Fieldset>,
    rhs: Option<&Fieldset>,
) -> Result<Option<Fieldset>, GraphError> {
    match (lhs, rhs) {
        (None, None) => Ok(None),
        (Some(fieldset), None) | (None, Some(fieldset)) => Ok(Some(fieldset.clone())),
        (Some(Fieldset::Preset(left)), Some(Fieldset::Preset(right))) => {
            if left == right {
                Ok(Some(Fieldset::Preset(left.clone())))
            } else {
                Err(GraphError::FieldsetMismatch {
                    id_field: id_field.to_string(),
                    left: left.clone(),
                    right: right.clone(),
                })
            }
        }
        (Some(left), Some(right)) => {
            let mut fields: Vec<String> = Vec::new();
            for token in left.tokens().into_iter().chain(right.tokens()) {
                if !fields.iter().any(|f| f == token) {
                    fields.push(token.to_string());
                }
            }
            Ok(Some(Fieldset::Fields(fields)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::follow::{DETAIL, LIST};
    use test_log::test;

    #[test]
    fn test_absent_fieldset_takes_the_other() {
        let merged = merge_follow(
            &Follow::new("motion_ids"),
            &Follow::new("motion_ids").with_fieldset(LIST),
        )
        .unwrap();
        assert_eq!(merged.fieldset, Some(Fieldset::Preset(LIST.into())));
    }

    #[test]
    fn test_lists_union_without_repeats() {
        let lhs = Follow::new("x").with_fieldset(&["title", "number"][..]);
        let rhs = Follow::new("x").with_fieldset(&["number", "state"][..]);
        let merged = merge_follow(&lhs, &rhs).unwrap();
        assert_eq!(
            merged.fieldset,
            Some(Fieldset::Fields(vec![
                "title".into(),
                "number".into(),
                "state".into()
            ]))
        );

        // A preset joins a list as one token
        let merged = merge_follow(&Follow::new("x").with_fieldset(DETAIL), &rhs).unwrap();
        assert_eq!(
            merged.fieldset,
            Some(Fieldset::Fields(vec![
                "detail".into(),
                "number".into(),
                "state".into()
            ]))
        );
    }

    #[test]
    fn test_bare_string_matches_object_entry() {
        let lhs = Follow::new("root").with_follow("tag_ids");
        let rhs = Follow::new("root").with_follow(
            Follow::new("tag_ids")
                .with_fieldset(LIST)
                .with_follow("tagged_ids"),
        );
        let merged = merge_follow(&lhs, &rhs).unwrap();
        assert_eq!(merged.follow.len(), 1);
        let tags = merged.follow[0].clone().into_node();
        assert_eq!(tags.fieldset, Some(Fieldset::Preset(LIST.into())));
        assert_eq!(tags.follow, vec![FollowEntry::IdField("tagged_ids".into())]);

        // And the other way round
        let merged = merge_follow(&rhs, &lhs).unwrap();
        assert_eq!(merged.follow.len(), 1);
        assert!(matches!(merged.follow[0], FollowEntry::Node(_)));
    }

    #[test]
    fn test_nested_mismatch_names_the_field() {
        let lhs = Follow::new("root").with_follow(Follow::new("motion_ids").with_fieldset(DETAIL));
        let rhs = Follow::new("root").with_follow(Follow::new("motion_ids").with_fieldset(LIST));
        match merge_follow(&lhs, &rhs) {
            Err(GraphError::FieldsetMismatch { id_field, .. }) => assert_eq!(id_field, "motion_ids"),
            other => panic!("expected a fieldset mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_root_keeps_first_id_field() {
        let merged = merge_follow(&Follow::new("a"), &Follow::new("b")).unwrap();
        assert_eq!(merged.id_field, "a");
    }
}
