//! Capability traits for the candidate collections of generic relations, and [AnyView], the
//! tagged union a generic relation resolves into.
use crate::{
    domain::{
        views::{
            ViewAgendaItem, ViewAssignment, ViewGroup, ViewListOfSpeakers, ViewMeeting,
            ViewMotion, ViewMotionBlock, ViewPersonalNote, ViewProjector, ViewTag, ViewTopic,
            ViewUser,
        },
        AGENDA_ITEM, ASSIGNMENT, GROUP, LIST_OF_SPEAKERS, MEETING, MOTION, MOTION_BLOCK,
        PERSONAL_NOTE, PROJECTOR, TAG, TOPIC, USER,
    },
    hydrate::{AsView, TypedView, ViewModel},
    key::Fqid,
};

/// Views that can be the content object of an agenda item.
pub trait HasAgendaItem<'a>: AsView<'a> {
    fn agenda_item(&self) -> Option<ViewAgendaItem<'a>> {
        self.view()
            .one("agenda_item")
            .and_then(ViewAgendaItem::from_view)
    }
}

/// Views that can own a list of speakers.
pub trait HasListOfSpeakers<'a>: AsView<'a> {
    fn list_of_speakers(&self) -> Option<ViewListOfSpeakers<'a>> {
        self.view()
            .one("list_of_speakers")
            .and_then(ViewListOfSpeakers::from_view)
    }
}

pub trait Taggable<'a>: AsView<'a> {
    fn tags(&self) -> Vec<ViewTag<'a>> {
        self.view()
            .many("tags")
            .into_iter()
            .filter_map(ViewTag::from_view)
            .collect()
    }
}

pub trait HasPersonalNotes<'a>: AsView<'a> {
    fn personal_notes(&self) -> Vec<ViewPersonalNote<'a>> {
        self.view()
            .many("personal_notes")
            .into_iter()
            .filter_map(ViewPersonalNote::from_view)
            .collect()
    }
}

/// A view of any collection of the meeting application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnyView<'a> {
    Meeting(ViewMeeting<'a>),
    Motion(ViewMotion<'a>),
    MotionBlock(ViewMotionBlock<'a>),
    User(ViewUser<'a>),
    Group(ViewGroup<'a>),
    Tag(ViewTag<'a>),
    AgendaItem(ViewAgendaItem<'a>),
    Topic(ViewTopic<'a>),
    Assignment(ViewAssignment<'a>),
    ListOfSpeakers(ViewListOfSpeakers<'a>),
    PersonalNote(ViewPersonalNote<'a>),
    Projector(ViewProjector<'a>),
}

impl<'a> AnyView<'a> {
    /// Dispatch on the view's collection. `None` for collections outside the application.
    pub fn from_view(view: ViewModel<'a>) -> Option<AnyView<'a>> {
        let any = match view.collection() {
            MEETING => AnyView::Meeting(ViewMeeting::from_view(view)?),
            MOTION => AnyView::Motion(ViewMotion::from_view(view)?),
            MOTION_BLOCK => AnyView::MotionBlock(ViewMotionBlock::from_view(view)?),
            USER => AnyView::User(ViewUser::from_view(view)?),
            GROUP => AnyView::Group(ViewGroup::from_view(view)?),
            TAG => AnyView::Tag(ViewTag::from_view(view)?),
            AGENDA_ITEM => AnyView::AgendaItem(ViewAgendaItem::from_view(view)?),
            TOPIC => AnyView::Topic(ViewTopic::from_view(view)?),
            ASSIGNMENT => AnyView::Assignment(ViewAssignment::from_view(view)?),
            LIST_OF_SPEAKERS => AnyView::ListOfSpeakers(ViewListOfSpeakers::from_view(view)?),
            PERSONAL_NOTE => AnyView::PersonalNote(ViewPersonalNote::from_view(view)?),
            PROJECTOR => AnyView::Projector(ViewProjector::from_view(view)?),
            other => {
                tracing::debug!("[AnyView] no view type for collection {other}");
                return None;
            }
        };
        Some(any)
    }

    pub fn as_view(&self) -> &ViewModel<'a> {
        match self {
            AnyView::Meeting(v) => v.view(),
            AnyView::Motion(v) => v.view(),
            AnyView::MotionBlock(v) => v.view(),
            AnyView::User(v) => v.view(),
            AnyView::Group(v) => v.view(),
            AnyView::Tag(v) => v.view(),
            AnyView::AgendaItem(v) => v.view(),
            AnyView::Topic(v) => v.view(),
            AnyView::Assignment(v) => v.view(),
            AnyView::ListOfSpeakers(v) => v.view(),
            AnyView::PersonalNote(v) => v.view(),
            AnyView::Projector(v) => v.view(),
        }
    }

    pub fn fqid(&self) -> &'a Fqid {
        self.as_view().fqid()
    }

    pub fn as_agenda_content(&self) -> Option<&dyn HasAgendaItem<'a>> {
        match self {
            AnyView::Motion(v) => Some(v),
            AnyView::MotionBlock(v) => Some(v),
            AnyView::Topic(v) => Some(v),
            AnyView::Assignment(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_speakers_content(&self) -> Option<&dyn HasListOfSpeakers<'a>> {
        match self {
            AnyView::Motion(v) => Some(v),
            AnyView::MotionBlock(v) => Some(v),
            AnyView::Topic(v) => Some(v),
            AnyView::Assignment(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_taggable(&self) -> Option<&dyn Taggable<'a>> {
        match self {
            AnyView::Motion(v) => Some(v),
            AnyView::AgendaItem(v) => Some(v),
            AnyView::Topic(v) => Some(v),
            AnyView::Assignment(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_note_content(&self) -> Option<&dyn HasPersonalNotes<'a>> {
        match self {
            AnyView::Motion(v) => Some(v),
            _ => None,
        }
    }
}

impl<'a> AsView<'a> for AnyView<'a> {
    fn view(&self) -> &ViewModel<'a> {
        self.as_view()
    }
}
