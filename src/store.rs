use std::fmt;

use serde_json::Value;

use crate::{model::ModelName, Result};

/// A persisted or unsaved instance of a registered model.
pub trait Record {
    /// Runtime model of the instance, possibly a subclass of the model it
    /// was looked up through.
    fn model(&self) -> &ModelName;

    /// Identifier, absent for unsaved records.
    fn id(&self) -> Option<&str>;
}

/// Persistence collaborator.
///
/// `has_association` is a probe: absence is `false`, never an error. `find`
/// returns [`crate::Error::NotFound`] when no record matches.
pub trait Store {
    type Record: Record;
    type Relation: fmt::Debug;

    /// Unscoped relation over a model and its subclasses.
    fn scope(&self, model: &ModelName) -> Self::Relation;

    fn has_association(&self, model: &ModelName, name: &str) -> bool;

    /// Collection reachable from `owner` through the association or accessor
    /// `name`.
    fn association(&self, owner: &Self::Record, name: &str) -> Result<Self::Relation>;

    fn find(&self, relation: &Self::Relation, id: &str) -> Result<Self::Record>;

    /// Builds an unsaved record within `relation`.
    fn build(&self, relation: &Self::Relation, attributes: Option<&Value>)
        -> Result<Self::Record>;
}
