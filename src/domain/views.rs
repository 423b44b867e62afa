use serde_json::Map as JsonMap;

use crate::{
    domain::{
        markers::{AnyView, HasAgendaItem, HasListOfSpeakers, HasPersonalNotes, Taggable},
        AGENDA_ITEM, ASSIGNMENT, GROUP, LIST_OF_SPEAKERS, MEETING, MOTION, MOTION_BLOCK,
        PERSONAL_NOTE, PROJECTOR, TAG, TOPIC, USER,
    },
    event::Delta,
    hydrate::{AsView, TypedView, ViewModel},
    key::{Fqid, Id},
    GraphError,
};

macro_rules! view_model {
    ($(#[$meta:meta])* $name:ident, $collection:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name<'a>(ViewModel<'a>);

        impl<'a> AsView<'a> for $name<'a> {
            fn view(&self) -> &ViewModel<'a> {
                &self.0
            }
        }

        impl<'a> TypedView<'a> for $name<'a> {
            const COLLECTION: &'static str = $collection;

            fn from_view(view: ViewModel<'a>) -> Option<Self> {
                (view.collection() == $collection).then_some($name(view))
            }
        }

        impl<'a> std::ops::Deref for $name<'a> {
            type Target = ViewModel<'a>;

            fn deref(&self) -> &ViewModel<'a> {
                &self.0
            }
        }
    };
}

fn typed<'a, V: TypedView<'a>>(views: Vec<ViewModel<'a>>) -> Vec<V> {
    views.into_iter().filter_map(V::from_view).collect()
}

fn one<'a, V: TypedView<'a>>(view: Option<ViewModel<'a>>) -> Option<V> {
    view.and_then(V::from_view)
}

view_model!(ViewMeeting, MEETING);
view_model!(ViewMotion, MOTION);
view_model!(ViewMotionBlock, MOTION_BLOCK);
view_model!(ViewUser, USER);
view_model!(ViewGroup, GROUP);
view_model!(ViewTag, TAG);
view_model!(ViewAgendaItem, AGENDA_ITEM);
view_model!(ViewTopic, TOPIC);
view_model!(ViewAssignment, ASSIGNMENT);
view_model!(ViewListOfSpeakers, LIST_OF_SPEAKERS);
view_model!(ViewPersonalNote, PERSONAL_NOTE);
view_model!(ViewProjector, PROJECTOR);

impl<'a> ViewMeeting<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.str_field("name")
    }

    /// Motions by ascending `sort_weight`.
    pub fn motions(&self) -> Vec<ViewMotion<'a>> {
        typed(self.many("motions"))
    }

    pub fn motion_blocks(&self) -> Vec<ViewMotionBlock<'a>> {
        typed(self.many("motion_blocks"))
    }

    pub fn agenda_items(&self) -> Vec<ViewAgendaItem<'a>> {
        typed(self.many("agenda_items"))
    }

    pub fn groups(&self) -> Vec<ViewGroup<'a>> {
        typed(self.many("groups"))
    }

    pub fn projectors(&self) -> Vec<ViewProjector<'a>> {
        typed(self.many("projectors"))
    }

    pub fn reference_projector(&self) -> Option<ViewProjector<'a>> {
        one(self.one("reference_projector"))
    }

    pub fn topics(&self) -> Vec<ViewTopic<'a>> {
        typed(self.many("topics"))
    }

    pub fn assignments(&self) -> Vec<ViewAssignment<'a>> {
        typed(self.many("assignments"))
    }

    pub fn tags(&self) -> Vec<ViewTag<'a>> {
        typed(self.many("tags"))
    }
}

impl<'a> ViewMotion<'a> {
    pub fn title(&self) -> Option<&'a str> {
        self.str_field("title")
    }

    pub fn number(&self) -> Option<&'a str> {
        self.str_field("number")
    }

    pub fn sort_weight(&self) -> Option<i64> {
        self.int_field("sort_weight")
    }

    pub fn meeting(&self) -> Option<ViewMeeting<'a>> {
        one(self.one("meeting"))
    }

    pub fn lead_motion(&self) -> Option<ViewMotion<'a>> {
        one(self.one("lead_motion"))
    }

    pub fn amendments(&self) -> Vec<ViewMotion<'a>> {
        typed(self.many("amendments"))
    }

    pub fn is_amendment(&self) -> bool {
        self.lead_motion().is_some()
    }

    pub fn block(&self) -> Option<ViewMotionBlock<'a>> {
        one(self.one("block"))
    }

    pub fn supporters(&self) -> Vec<ViewUser<'a>> {
        typed(self.many("supporters"))
    }
}

impl<'a> HasAgendaItem<'a> for ViewMotion<'a> {}
impl<'a> HasListOfSpeakers<'a> for ViewMotion<'a> {}
impl<'a> Taggable<'a> for ViewMotion<'a> {}
impl<'a> HasPersonalNotes<'a> for ViewMotion<'a> {}

impl<'a> ViewMotionBlock<'a> {
    pub fn title(&self) -> Option<&'a str> {
        self.str_field("title")
    }

    pub fn meeting(&self) -> Option<ViewMeeting<'a>> {
        one(self.one("meeting"))
    }

    pub fn motions(&self) -> Vec<ViewMotion<'a>> {
        typed(self.many("motions"))
    }
}

impl<'a> HasAgendaItem<'a> for ViewMotionBlock<'a> {}
impl<'a> HasListOfSpeakers<'a> for ViewMotionBlock<'a> {}

impl<'a> ViewUser<'a> {
    pub fn username(&self) -> Option<&'a str> {
        self.str_field("username")
    }

    /// Display name: first and last name if present, else the username.
    pub fn full_name(&self) -> String {
        let parts = ["first_name", "last_name"]
            .iter()
            .filter_map(|f| self.str_field(f))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if parts.is_empty() {
            self.username().unwrap_or_default().to_string()
        } else {
            parts.join(" ")
        }
    }

    pub fn supported_motions(&self) -> Vec<ViewMotion<'a>> {
        typed(self.many("supported_motions"))
    }

    /// Groups in the active meeting of the hydrator's context.
    pub fn groups(&self) -> Vec<ViewGroup<'a>> {
        typed(self.many("groups"))
    }

    pub fn groups_in(&self, meeting: Id) -> Vec<ViewGroup<'a>> {
        typed(self.many_for("groups", Some(meeting)))
    }

    /// Raw group ids per meeting, as delivered.
    pub fn group_ids_in(&self, meeting: Id) -> Vec<Id> {
        self.structured_field("group_$_ids", meeting)
            .map(|value| value.ids())
            .unwrap_or_default()
    }

    pub fn vote_delegated_to(&self) -> Option<ViewUser<'a>> {
        one(self.one("vote_delegated_to"))
    }

    pub fn vote_delegated_to_in(&self, meeting: Id) -> Option<ViewUser<'a>> {
        one(self.one_for("vote_delegated_to", Some(meeting)))
    }

    pub fn vote_delegations_from(&self) -> Vec<ViewUser<'a>> {
        typed(self.many("vote_delegations_from"))
    }

    pub fn vote_delegations_from_in(&self, meeting: Id) -> Vec<ViewUser<'a>> {
        typed(self.many_for("vote_delegations_from", Some(meeting)))
    }
}

impl<'a> ViewGroup<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.str_field("name")
    }

    pub fn meeting(&self) -> Option<ViewMeeting<'a>> {
        one(self.one("meeting"))
    }

    pub fn users(&self) -> Vec<ViewUser<'a>> {
        typed(self.many("users"))
    }
}

impl<'a> ViewTag<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.str_field("name")
    }

    pub fn meeting(&self) -> Option<ViewMeeting<'a>> {
        one(self.one("meeting"))
    }

    /// Tagged records of any taggable collection, by ascending id.
    pub fn tagged(&self) -> Vec<AnyView<'a>> {
        self.many("tagged")
            .into_iter()
            .filter_map(AnyView::from_view)
            .collect()
    }
}

impl<'a> ViewAgendaItem<'a> {
    pub fn item_number(&self) -> Option<&'a str> {
        self.str_field("item_number")
    }

    pub fn weight(&self) -> Option<i64> {
        self.int_field("weight")
    }

    pub fn meeting(&self) -> Option<ViewMeeting<'a>> {
        one(self.one("meeting"))
    }

    pub fn content_object(&self) -> Option<AnyView<'a>> {
        self.one("content_object").and_then(AnyView::from_view)
    }
}

impl<'a> Taggable<'a> for ViewAgendaItem<'a> {}

impl<'a> ViewTopic<'a> {
    pub fn title(&self) -> Option<&'a str> {
        self.str_field("title")
    }

    pub fn meeting(&self) -> Option<ViewMeeting<'a>> {
        one(self.one("meeting"))
    }
}

impl<'a> HasAgendaItem<'a> for ViewTopic<'a> {}
impl<'a> HasListOfSpeakers<'a> for ViewTopic<'a> {}
impl<'a> Taggable<'a> for ViewTopic<'a> {}

impl<'a> ViewAssignment<'a> {
    pub fn title(&self) -> Option<&'a str> {
        self.str_field("title")
    }

    pub fn meeting(&self) -> Option<ViewMeeting<'a>> {
        one(self.one("meeting"))
    }
}

impl<'a> HasAgendaItem<'a> for ViewAssignment<'a> {}
impl<'a> HasListOfSpeakers<'a> for ViewAssignment<'a> {}
impl<'a> Taggable<'a> for ViewAssignment<'a> {}

impl<'a> ViewListOfSpeakers<'a> {
    pub fn closed(&self) -> bool {
        self.bool_field("closed").unwrap_or(false)
    }

    pub fn content_object(&self) -> Option<AnyView<'a>> {
        self.one("content_object").and_then(AnyView::from_view)
    }
}

impl<'a> ViewPersonalNote<'a> {
    pub fn note(&self) -> Option<&'a str> {
        self.str_field("note")
    }

    pub fn star(&self) -> bool {
        self.bool_field("star").unwrap_or(false)
    }

    pub fn content_object(&self) -> Option<AnyView<'a>> {
        self.one("content_object").and_then(AnyView::from_view)
    }
}

impl<'a> ViewProjector<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.str_field("name")
    }

    pub fn meeting(&self) -> Option<ViewMeeting<'a>> {
        one(self.one("meeting"))
    }

    pub fn used_as_reference_projector_meeting(&self) -> Option<ViewMeeting<'a>> {
        one(self.one("used_as_reference_projector_meeting"))
    }

    /// `(numerator, denominator)`, if both are set.
    pub fn aspect_ratio(&self) -> Option<(i64, i64)> {
        Some((
            self.int_field("aspect_ratio_numerator")?,
            self.int_field("aspect_ratio_denominator")?,
        ))
    }

    /// Build the update delta that sets the aspect ratio from its `"W:H"` text form.
    ///
    /// Anything other than two positive integers around a single `:` is rejected without
    /// touching the store.
    pub fn aspect_ratio_patch(&self, ratio: &str) -> Result<Delta, GraphError> {
        let (numerator, denominator) = parse_aspect_ratio(ratio)?;
        let mut changed_fields = JsonMap::new();
        changed_fields.insert("aspect_ratio_numerator".to_string(), numerator.into());
        changed_fields.insert("aspect_ratio_denominator".to_string(), denominator.into());
        Ok(Delta::Update {
            fqid: Fqid::new(PROJECTOR, self.id()),
            changed_fields,
        })
    }
}

fn parse_aspect_ratio(ratio: &str) -> Result<(u32, u32), GraphError> {
    let malformed = |reason: &str| GraphError::MalformedValue {
        field: "aspect_ratio".to_string(),
        reason: format!("{reason} in '{ratio}'"),
    };
    let parts = ratio.split(':').collect::<Vec<_>>();
    let [numerator, denominator] = parts[..] else {
        return Err(malformed("expected exactly one ':'"));
    };
    let parse = |part: &str| -> Result<u32, GraphError> {
        match part.trim().parse::<u32>() {
            Ok(0) => Err(malformed("zero component")),
            Ok(n) => Ok(n),
            Err(_) => Err(malformed("non-numeric component")),
        }
    };
    Ok((parse(numerator)?, parse(denominator)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aspect_ratio() {
        assert_eq!(parse_aspect_ratio("16:9").unwrap(), (16, 9));
        assert_eq!(parse_aspect_ratio(" 4 : 3 ").unwrap(), (4, 3));
        for bad in ["16x9", "16:9:1", "16:", "a:b", "0:9", "-4:3", ""] {
            assert!(
                matches!(
                    parse_aspect_ratio(bad),
                    Err(GraphError::MalformedValue { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }
}
