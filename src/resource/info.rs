use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    inflector,
    model::{ModelName, ModelRegistry},
    resource::{extract, Info, ParentInfo},
    store::Store,
    Result,
};

/// The primary resource of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceInfo {
    path: String,
    model: ModelName,
    real_model: ModelName,
    name: String,
    plural_name: String,
    params: Option<Value>,
}

impl ResourceInfo {
    /// Resolves the declared resource `declared` (e.g. `"accounts"`,
    /// `"lottery/assignments"`) against the submitted `params`.
    ///
    /// The real model is the first subclass of the declared model whose
    /// parameter key was submitted, or the declared model itself.
    pub fn resolve(models: &ModelRegistry, declared: &str, params: &Value) -> Result<Self> {
        let model = models.classify(declared)?;

        let path = inflector::underscore(declared);
        let last = path.rsplit('/').next().unwrap_or(&path);
        let name = inflector::var_name(&inflector::singularize(last));
        let plural_name = inflector::var_name(&inflector::pluralize(&path));

        let real_model = models
            .descendants(&model)
            .into_iter()
            .find(|candidate| params.get(candidate.var_name()).is_some())
            .cloned()
            .unwrap_or_else(|| model.clone());
        let params = extract(params, &real_model.var_name());

        debug!(%model, %real_model, name = %name, "resolved resource");
        Ok(Self {
            path: declared.to_owned(),
            model,
            real_model,
            name,
            plural_name,
            params,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    /// Relation the resource is loaded from or built in.
    ///
    /// Nested under a parent, the parent's association named by its alias
    /// (or by the plural name) is used when the parent model declares it;
    /// otherwise the conventional accessor, the pluralized model name without
    /// namespace. Without a parent, the real model itself.
    pub fn relation<S: Store>(
        &self,
        store: &S,
        parent: Option<&ParentInfo<S::Record>>,
    ) -> Result<S::Relation> {
        let parent = match parent {
            Some(parent) => parent,
            None => return Ok(store.scope(&self.real_model)),
        };

        let name = parent.alias().unwrap_or(&self.plural_name);
        if store.has_association(parent.model(), name) {
            return store.association(parent.object(), name);
        }

        let accessor =
            inflector::pluralize(&inflector::underscore(inflector::demodulize(&self.model)));
        if parent.alias().is_some() {
            warn!(
                parent = %parent.model(),
                alias = name,
                accessor = %accessor,
                "declared alias is not an association, falling back to accessor"
            );
        }
        store.association(parent.object(), &accessor)
    }
}

impl Info for ResourceInfo {
    fn model(&self) -> &ModelName {
        &self.model
    }

    fn real_model(&self) -> &ModelName {
        &self.real_model
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }
}
