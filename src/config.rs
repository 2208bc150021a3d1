use serde::Deserialize;

use crate::{model::ModelName, Error, Result};

/// How an action relates to the resource it targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Builds an unsaved instance (`new`, `create`).
    New,
    /// Loads one existing instance by id (`show`, `edit`, `update`, `destroy`).
    Member,
    /// No singular instance (`index`).
    Collection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationTarget {
    /// A registered model name, used as is.
    Model(ModelName),
    /// An identifier to classify, e.g. `"clients"` or `"lottery/packages"`.
    Identifier(String),
}

/// A model the resource may be nested under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Association {
    #[serde(flatten)]
    pub target: AssociationTarget,
    /// Association on the parent leading to the resource, when it differs
    /// from the resource's plural name.
    #[serde(rename = "as", default)]
    pub alias: Option<String>,
}

impl Association {
    pub fn model(model: impl Into<ModelName>) -> Self {
        Self {
            target: AssociationTarget::Model(model.into()),
            alias: None,
        }
    }

    pub fn identifier(identifier: impl Into<String>) -> Self {
        Self {
            target: AssociationTarget::Identifier(identifier.into()),
            alias: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Actions {
    pub new: Vec<String>,
    pub member: Vec<String>,
    pub collection: Vec<String>,
}

impl Default for Actions {
    fn default() -> Self {
        Self {
            new: words(&["new", "create"]),
            member: words(&["show", "edit", "update", "destroy"]),
            collection: words(&["index"]),
        }
    }
}

impl Actions {
    /// Category of `action`. Actions not listed anywhere behave as
    /// collection actions: no instance is loaded.
    pub fn kind(&self, action: &str) -> ActionKind {
        if listed(&self.new, action) {
            ActionKind::New
        } else if listed(&self.member, action) {
            ActionKind::Member
        } else {
            ActionKind::Collection
        }
    }
}

/// Declared resource of a controller-like unit: the model identifier, the
/// parents it may be nested under (in priority order) and action
/// categories.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceConfig {
    pub model: String,
    #[serde(default)]
    pub belongs_to: Vec<Association>,
    #[serde(default)]
    pub actions: Actions,
}

impl ResourceConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            belongs_to: Vec::new(),
            actions: Actions::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(Error::Deserializing)?;
        config.validate()?;
        Ok(config)
    }

    pub fn belongs_to(mut self, association: Association) -> Self {
        self.belongs_to.push(association);
        self
    }

    pub fn with_actions(mut self, actions: Actions) -> Self {
        self.actions = actions;
        self
    }

    pub fn has_associations(&self) -> bool {
        !self.belongs_to.is_empty()
    }

    /// Checks the model identifier is present and that no action is listed
    /// in more than one category.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Validation("model must be specified".into()));
        }

        let Actions {
            new,
            member,
            collection,
        } = &self.actions;
        let categories = [("new", new), ("member", member), ("collection", collection)];
        for (i, (name, actions)) in categories.iter().enumerate() {
            for (other, others) in &categories[i + 1..] {
                if let Some(action) = actions.iter().find(|a| others.contains(a)) {
                    return Err(Error::Validation(format!(
                        "action {} is both a {} and a {} action",
                        action, name, other
                    )));
                }
            }
        }
        Ok(())
    }
}

fn listed(list: &[String], action: &str) -> bool {
    list.iter().any(|a| a == action)
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_owned()).collect()
}
