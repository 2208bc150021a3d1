use std::iter;

use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    config::{Association, AssociationTarget},
    model::{ModelName, ModelRegistry},
    resource::{extract, Info, PathParams},
    store::{Record, Store},
    Result,
};

/// The parent a resource is nested under, e.g. the client in
/// `/clients/7/accounts`.
///
/// A `ParentInfo` only exists when a parent was actually found and loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentInfo<R> {
    model: ModelName,
    matched: ModelName,
    name: String,
    id: String,
    alias: Option<String>,
    object: R,
    params: Option<Value>,
}

impl<R: Record> ParentInfo<R> {
    /// Finds which candidate parent the request is nested under and loads it.
    ///
    /// Candidates are tried in order. For each candidate model, the model and
    /// then its subclasses are probed for a `<name>_id` path parameter, where
    /// `<name>` is the namespace-flattened name and, for namespaced models,
    /// the name without namespace. The first hit wins.
    ///
    /// Returns `Ok(None)` when no candidate matches. A matching id that cannot
    /// be loaded is an error from the store.
    pub fn resolve<S>(
        store: &S,
        models: &ModelRegistry,
        candidates: &[Association],
        params: &Value,
        path_params: &PathParams,
    ) -> Result<Option<Self>>
    where
        S: Store<Record = R>,
    {
        for association in candidates {
            let model = match &association.target {
                AssociationTarget::Model(model) => model.clone(),
                AssociationTarget::Identifier(identifier) => models.classify(identifier)?,
            };

            let found = iter::once(&model)
                .chain(models.descendants(&model))
                .find_map(|candidate| {
                    lookup_id(candidate, path_params).map(|(name, id)| (candidate.clone(), name, id))
                });

            if let Some((matched, name, id)) = found {
                debug!(parent = %matched, %id, "loading parent");
                let object = store.find(&store.scope(&matched), &id)?;
                let params = extract(params, &matched.var_name());
                return Ok(Some(Self {
                    model,
                    matched,
                    name,
                    id,
                    alias: association.alias.clone(),
                    object,
                    params,
                }));
            }
        }

        trace!("no parent in path parameters");
        Ok(None)
    }

    pub fn object(&self) -> &R {
        &self.object
    }

    pub fn into_object(self) -> R {
        self.object
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The model or subclass whose id parameter was present.
    pub fn matched_model(&self) -> &ModelName {
        &self.matched
    }
}

impl<R: Record> Info for ParentInfo<R> {
    fn model(&self) -> &ModelName {
        &self.model
    }

    fn real_model(&self) -> &ModelName {
        self.object.model()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }
}

fn lookup_id(model: &ModelName, path_params: &PathParams) -> Option<(String, String)> {
    let name = model.var_name();
    if let Some(id) = path_params.get(&format!("{}_id", name)) {
        return Some((name, id.clone()));
    }
    if model.is_namespaced() {
        let name = model.demodulized_var_name();
        if let Some(id) = path_params.get(&format!("{}_id", name)) {
            return Some((name, id.clone()));
        }
    }
    None
}
