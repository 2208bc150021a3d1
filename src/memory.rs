//! In-memory [`Store`] backed by a list of records.
//!
//! Lookups through a model also match records of its subclasses, and
//! associations declared on a model are inherited by its subclasses.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::trace;

use crate::{
    model::{ModelName, ModelRegistry},
    store::{Record, Store},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    model: ModelName,
    id: Option<String>,
    attributes: Map<String, Value>,
}

impl MemoryRecord {
    pub fn new(model: impl Into<ModelName>, id: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            id: Some(id.into()),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_owned(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl Record for MemoryRecord {
    fn model(&self) -> &ModelName {
        &self.model
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryRelation {
    Model(ModelName),
    Association {
        owner: ModelName,
        owner_id: Option<String>,
        name: String,
        model: ModelName,
        foreign_key: String,
    },
}

impl MemoryRelation {
    pub fn model(&self) -> &ModelName {
        match self {
            MemoryRelation::Model(model) | MemoryRelation::Association { model, .. } => model,
        }
    }
}

#[derive(Debug, Clone)]
struct AssociationDef {
    model: ModelName,
    foreign_key: String,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    models: ModelRegistry,
    records: Vec<MemoryRecord>,
    associations: HashMap<(ModelName, String), AssociationDef>,
}

impl MemoryStore {
    pub fn new(models: ModelRegistry) -> Self {
        Self {
            models,
            records: Vec::new(),
            associations: HashMap::new(),
        }
    }

    /// Declares a one-to-many association `owner.name -> model`, linked by
    /// the `foreign_key` attribute of `model` records.
    pub fn has_many(
        &mut self,
        owner: impl Into<ModelName>,
        name: &str,
        model: impl Into<ModelName>,
        foreign_key: &str,
    ) -> &mut Self {
        self.associations.insert(
            (owner.into(), name.to_owned()),
            AssociationDef {
                model: model.into(),
                foreign_key: foreign_key.to_owned(),
            },
        );
        self
    }

    pub fn insert(&mut self, record: MemoryRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    fn association_def(&self, model: &ModelName, name: &str) -> Option<&AssociationDef> {
        self.models
            .ancestors(model)
            .into_iter()
            .find_map(|ancestor| self.associations.get(&(ancestor, name.to_owned())))
    }

    fn matches(&self, relation: &MemoryRelation, record: &MemoryRecord) -> bool {
        match relation {
            MemoryRelation::Model(model) => self.models.is_a(&record.model, model),
            MemoryRelation::Association {
                owner_id,
                model,
                foreign_key,
                ..
            } => {
                self.models.is_a(&record.model, model)
                    && match (owner_id, record.attribute(foreign_key)) {
                        (Some(owner_id), Some(value)) => value_matches(value, owner_id),
                        _ => false,
                    }
            }
        }
    }
}

impl Store for MemoryStore {
    type Record = MemoryRecord;
    type Relation = MemoryRelation;

    fn scope(&self, model: &ModelName) -> MemoryRelation {
        MemoryRelation::Model(model.clone())
    }

    fn has_association(&self, model: &ModelName, name: &str) -> bool {
        self.association_def(model, name).is_some()
    }

    fn association(&self, owner: &MemoryRecord, name: &str) -> Result<MemoryRelation> {
        let def = self
            .association_def(&owner.model, name)
            .ok_or_else(|| Error::UnknownAssociation {
                model: owner.model.clone(),
                name: name.to_owned(),
            })?;
        Ok(MemoryRelation::Association {
            owner: owner.model.clone(),
            owner_id: owner.id.clone(),
            name: name.to_owned(),
            model: def.model.clone(),
            foreign_key: def.foreign_key.clone(),
        })
    }

    fn find(&self, relation: &MemoryRelation, id: &str) -> Result<MemoryRecord> {
        trace!(?relation, id, "finding record");
        self.records
            .iter()
            .find(|record| record.id.as_deref() == Some(id) && self.matches(relation, record))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                model: relation.model().clone(),
                id: id.to_owned(),
            })
    }

    fn build(&self, relation: &MemoryRelation, attributes: Option<&Value>) -> Result<MemoryRecord> {
        let mut attributes = match attributes {
            None => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(Error::Validation(format!(
                    "attributes for {} must be an object, got {}",
                    relation.model(),
                    other
                )))
            }
        };
        if let MemoryRelation::Association {
            owner_id: Some(owner_id),
            foreign_key,
            ..
        } = relation
        {
            attributes.insert(foreign_key.clone(), Value::String(owner_id.clone()));
        }
        Ok(MemoryRecord {
            model: relation.model().clone(),
            id: None,
            attributes,
        })
    }
}

fn value_matches(value: &Value, id: &str) -> bool {
    match value {
        Value::String(s) => s == id,
        Value::Number(n) => n.to_string() == id,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::registry;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new(registry());
        store
            .has_many("Client", "accounts", "Account", "client_id")
            .insert(MemoryRecord::new("Client", "7"))
            .insert(MemoryRecord::new("Account", "1").with_attribute("client_id", 7))
            .insert(MemoryRecord::new("SecretAccount", "2").with_attribute("client_id", "8"));
        store
    }

    #[test]
    fn find_through_model_matches_subclasses() {
        let store = store();
        let record = store.find(&store.scope(&"Account".into()), "2").unwrap();
        assert_eq!("SecretAccount", record.model().as_str());

        assert_matches!(
            store.find(&store.scope(&"SecretAccount".into()), "1"),
            Err(Error::NotFound { model, id }) if model.as_str() == "SecretAccount" && id == "1"
        );
    }

    #[test]
    fn association_scopes_by_foreign_key() {
        let store = store();
        let client = store.find(&store.scope(&"Client".into()), "7").unwrap();
        let accounts = store.association(&client, "accounts").unwrap();

        assert!(store.find(&accounts, "1").is_ok());
        assert_matches!(store.find(&accounts, "2"), Err(Error::NotFound { .. }));
    }

    #[test]
    fn associations_are_inherited_and_probed() {
        let store = store();
        assert!(store.has_association(&"Client".into(), "accounts"));
        assert!(store.has_association(&"VipClient".into(), "accounts"));
        assert!(!store.has_association(&"Client".into(), "prizes"));

        let vip = MemoryRecord::new("VipClient", "9");
        assert_matches!(
            store.association(&vip, "prizes"),
            Err(Error::UnknownAssociation { name, .. }) if name == "prizes"
        );
    }

    #[test]
    fn build_sets_foreign_key_and_stays_unsaved() {
        let store = store();
        let client = MemoryRecord::new("Client", "7");
        let accounts = store.association(&client, "accounts").unwrap();

        let record = store.build(&accounts, Some(&json!({"name": "X"}))).unwrap();
        assert!(!record.is_persisted());
        assert_eq!(Some(&json!("X")), record.attribute("name"));
        assert_eq!(Some(&json!("7")), record.attribute("client_id"));

        assert_matches!(
            store.build(&store.scope(&"Account".into()), Some(&json!([1]))),
            Err(Error::Validation(_))
        );
    }
}
