use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

/// Named preset for all fields of a model.
pub const DETAIL: &str = "detail";
/// Named preset for the minimal navigation subset of a model.
pub const ROUTING: &str = "routing";
/// Named preset for the fields shown in list views.
pub const LIST: &str = "list";

/// Which fields of a model to hydrate: a named preset or an explicit list. Presets are opaque
/// tokens here; the transport maps them to fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fieldset {
    Preset(String),
    Fields(Vec<String>),
}

impl Fieldset {
    pub fn is_preset(&self) -> bool {
        matches!(self, Fieldset::Preset(_))
    }

    /// The tokens of this fieldset; a preset is one token.
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Fieldset::Preset(preset) => vec![preset.as_str()],
            Fieldset::Fields(fields) => fields.iter().map(String::as_str).collect(),
        }
    }
}

impl Display for Fieldset {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Fieldset::Preset(preset) => write!(f, "{preset}"),
            Fieldset::Fields(fields) => write!(f, "[{}]", fields.join(", ")),
        }
    }
}

impl From<&str> for Fieldset {
    fn from(preset: &str) -> Self {
        Fieldset::Preset(preset.to_string())
    }
}

impl From<&[&str]> for Fieldset {
    fn from(fields: &[&str]) -> Self {
        Fieldset::Fields(fields.iter().map(|f| f.to_string()).collect())
    }
}

/// One entry of a follow list. A bare string is shorthand for a node with only an `idField`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FollowEntry {
    IdField(String),
    Node(Follow),
}

impl FollowEntry {
    pub fn id_field(&self) -> &str {
        match self {
            FollowEntry::IdField(id_field) => id_field,
            FollowEntry::Node(node) => &node.id_field,
        }
    }

    /// The object form of this entry.
    pub fn into_node(self) -> Follow {
        match self {
            FollowEntry::IdField(id_field) => Follow::new(&id_field),
            FollowEntry::Node(node) => node,
        }
    }

    /// The shortest entry equivalent to `node`.
    pub fn from_node(node: Follow) -> FollowEntry {
        if node.follow.is_empty() && node.fieldset.is_none() {
            FollowEntry::IdField(node.id_field)
        } else {
            FollowEntry::Node(node)
        }
    }
}

impl From<&str> for FollowEntry {
    fn from(id_field: &str) -> Self {
        FollowEntry::IdField(id_field.to_string())
    }
}

impl From<Follow> for FollowEntry {
    fn from(node: Follow) -> Self {
        FollowEntry::Node(node)
    }
}

/// A node of a follow tree: the raw id field to follow, what to hydrate on the related
/// records, and which of their relations to follow further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id_field: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow: Vec<FollowEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fieldset: Option<Fieldset>,
}

impl Follow {
    pub fn new(id_field: &str) -> Follow {
        Follow {
            id_field: id_field.to_string(),
            follow: Vec::new(),
            fieldset: None,
        }
    }

    pub fn with_fieldset(mut self, fieldset: impl Into<Fieldset>) -> Follow {
        self.fieldset = Some(fieldset.into());
        self
    }

    pub fn with_follow(mut self, entry: impl Into<FollowEntry>) -> Follow {
        self.follow.push(entry.into());
        self
    }

    pub fn entry(&self, id_field: &str) -> Option<&FollowEntry> {
        self.follow.iter().find(|e| e.id_field() == id_field)
    }

    /// Everything this tree asks for, flattened to `path` and `path#token` strings, where
    /// `path` joins id fields below the root with `.`. Two trees with the same set request
    /// the same data.
    pub fn requested(&self) -> BTreeSet<String> {
        let mut requested = BTreeSet::new();
        self.collect_requested("", &mut requested);
        requested
    }

    fn collect_requested(&self, path: &str, requested: &mut BTreeSet<String>) {
        if let Some(fieldset) = &self.fieldset {
            for token in fieldset.tokens() {
                requested.insert(format!("{path}#{token}"));
            }
        }
        for entry in self.follow.iter() {
            let child = if path.is_empty() {
                entry.id_field().to_string()
            } else {
                format!("{path}.{}", entry.id_field())
            };
            requested.insert(child.clone());
            if let FollowEntry::Node(node) = entry {
                node.collect_requested(&child, requested);
            }
        }
    }
}
