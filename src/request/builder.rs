use crate::{
    key::Id,
    relation::Registry,
    request::{
        follow::{Fieldset, Follow},
        merge::insert_entry,
        model::ModelRequest,
    },
    GraphError,
};

/// Builds one follow node, translating logical relation names into the raw id fields the
/// transport understands.
///
/// Errors are collected and reported by the enclosing [ModelRequestBuilder::build].
#[derive(Debug)]
pub struct FollowBuilder<'r> {
    registry: &'r Registry,
    /// Collections the relations of this node are looked up on. More than one below a generic
    /// relation.
    collections: Vec<String>,
    node: Follow,
    errors: Vec<GraphError>,
}

impl<'r> FollowBuilder<'r> {
    fn new(registry: &'r Registry, collections: Vec<String>, id_field: &str) -> FollowBuilder<'r> {
        FollowBuilder {
            registry,
            collections,
            node: Follow::new(id_field),
            errors: Vec::new(),
        }
    }

    pub fn fieldset(mut self, fieldset: impl Into<Fieldset>) -> FollowBuilder<'r> {
        self.node.fieldset = Some(fieldset.into());
        self
    }

    /// Follow `relation` without further nesting.
    pub fn follow(self, relation: &str) -> FollowBuilder<'r> {
        self.follow_with(relation, |f| f)
    }

    pub fn follow_with(
        self,
        relation: &str,
        nested: impl FnOnce(FollowBuilder<'r>) -> FollowBuilder<'r>,
    ) -> FollowBuilder<'r> {
        self.push(relation, None, nested)
    }

    /// Follow a structured relation for one owner.
    pub fn follow_owned(
        self,
        relation: &str,
        owner: Id,
        nested: impl FnOnce(FollowBuilder<'r>) -> FollowBuilder<'r>,
    ) -> FollowBuilder<'r> {
        self.push(relation, Some(owner), nested)
    }

    fn push(
        mut self,
        relation: &str,
        owner: Option<Id>,
        nested: impl FnOnce(FollowBuilder<'r>) -> FollowBuilder<'r>,
    ) -> FollowBuilder<'r> {
        let registry = self.registry;
        let Some(descriptor) = self
            .collections
            .iter()
            .find_map(|collection| registry.get(collection, relation))
        else {
            self.errors.push(GraphError::UnknownRelation {
                collection: self.collections.join("|"),
                field: relation.to_string(),
            });
            return self;
        };
        if descriptor.is_structured() && owner.is_none() {
            self.errors.push(GraphError::RequestMismatch(format!(
                "structured relation `{relation}` needs an owner id"
            )));
            return self;
        }
        let child = FollowBuilder::new(
            registry,
            descriptor
                .foreign
                .collections()
                .into_iter()
                .map(str::to_string)
                .collect(),
            &descriptor.own_id_field.wire_name(owner),
        );
        match nested(child).finish() {
            Ok(node) => {
                if let Err(e) = insert_entry(&mut self.node.follow, node) {
                    self.errors.push(e);
                }
            }
            Err(e) => self.errors.push(e),
        }
        self
    }

    fn finish(mut self) -> Result<Follow, GraphError> {
        if self.errors.is_empty() {
            Ok(self.node)
        } else {
            Err(self.errors.remove(0))
        }
    }
}

/// Registry-aware construction of a [ModelRequest].
///
/// ```rust
/// # use meetgraph_core::{relation::{make_m2o, Registry, M2O}, request::ModelRequestBuilder};
/// let registry = Registry::builder()
///     .add(make_m2o(M2O {
///         one: "meeting",
///         many: "motion",
///         one_field: "motions",
///         many_field: "meeting",
///         one_id_field: Some("motion_ids"),
///         ..Default::default()
///     }))
///     .build()
///     .unwrap();
/// let request = ModelRequestBuilder::new(&registry, "meeting", [1])
///     .fieldset("detail")
///     .follow_with("motions", |motions| motions.fieldset("list"))
///     .build()
///     .unwrap();
/// assert_eq!(request.follow[0].id_field(), "motion_ids");
/// ```
#[derive(Debug)]
pub struct ModelRequestBuilder<'r> {
    ids: Vec<Id>,
    root: FollowBuilder<'r>,
}

impl<'r> ModelRequestBuilder<'r> {
    pub fn new(
        registry: &'r Registry,
        collection: &str,
        ids: impl IntoIterator<Item = Id>,
    ) -> ModelRequestBuilder<'r> {
        ModelRequestBuilder {
            ids: ids.into_iter().collect(),
            root: FollowBuilder::new(registry, vec![collection.to_string()], collection),
        }
    }

    pub fn fieldset(mut self, fieldset: impl Into<Fieldset>) -> ModelRequestBuilder<'r> {
        self.root = self.root.fieldset(fieldset);
        self
    }

    pub fn follow(mut self, relation: &str) -> ModelRequestBuilder<'r> {
        self.root = self.root.follow(relation);
        self
    }

    pub fn follow_with(
        mut self,
        relation: &str,
        nested: impl FnOnce(FollowBuilder<'r>) -> FollowBuilder<'r>,
    ) -> ModelRequestBuilder<'r> {
        self.root = self.root.follow_with(relation, nested);
        self
    }

    pub fn follow_owned(
        mut self,
        relation: &str,
        owner: Id,
        nested: impl FnOnce(FollowBuilder<'r>) -> FollowBuilder<'r>,
    ) -> ModelRequestBuilder<'r> {
        self.root = self.root.follow_owned(relation, owner, nested);
        self
    }

    pub fn build(self) -> Result<ModelRequest, GraphError> {
        let root = self.root.finish()?;
        Ok(ModelRequest {
            collection: root.id_field,
            ids: self.ids,
            fieldset: root.fieldset,
            follow: root.follow,
        })
    }
}
