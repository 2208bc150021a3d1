use std::{collections::HashMap, fmt};

use serde_json::Value;
use tracing::debug;

use crate::{
    config::{ActionKind, ResourceConfig},
    gate::{AuthorizationGate, Target},
    model::{ModelName, ModelRegistry},
    resource::{Info, ParentInfo, PathParams, ResourceInfo},
    store::Store,
    Error, Result,
};

/// The surrounding context resources are bound into, e.g. a controller's
/// instance variables.
pub trait Context<R> {
    fn instance(&self, name: &str) -> Option<&R>;

    fn set_instance(&mut self, name: &str, instance: R);

    /// Post-load hook, invoked once loading completed for every action kind.
    fn after_load(&mut self, _action: &str, _kind: ActionKind) -> Result<()> {
        Ok(())
    }
}

/// Named instance and collection slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings<R> {
    instances: HashMap<String, R>,
    collections: HashMap<String, Vec<R>>,
}

impl<R> Default for Bindings<R> {
    fn default() -> Self {
        Self {
            instances: HashMap::new(),
            collections: HashMap::new(),
        }
    }
}

impl<R> Bindings<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_instances(&mut self, name: &str, instances: Vec<R>) {
        self.collections.insert(name.to_owned(), instances);
    }

    pub fn instances(&self, name: &str) -> Option<&[R]> {
        self.collections.get(name).map(Vec::as_slice)
    }
}

impl<R> Context<R> for Bindings<R> {
    fn instance(&self, name: &str) -> Option<&R> {
        self.instances.get(name)
    }

    fn set_instance(&mut self, name: &str, instance: R) {
        self.instances.insert(name.to_owned(), instance);
    }
}

/// Whatever a resource materialized: a collection, if one was bound, or the
/// single instance.
#[derive(Debug, PartialEq)]
pub enum Instantiated<'a, R> {
    Collection(&'a [R]),
    Instance(&'a R),
}

/// An action's resource: the resolved primary resource, its optional parent,
/// and the relation used to load or build instances.
pub struct Resource<'s, S: Store> {
    store: &'s S,
    action: String,
    kind: ActionKind,
    id: Option<String>,
    info: ResourceInfo,
    parent_info: Option<ParentInfo<S::Record>>,
    relation: S::Relation,
}

impl<S> fmt::Debug for Resource<'_, S>
where
    S: Store,
    S::Record: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("action", &self.action)
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("info", &self.info)
            .field("parent_info", &self.parent_info)
            .field("relation", &self.relation)
            .finish()
    }
}

impl<'s, S> Resource<'s, S>
where
    S: Store,
    S::Record: Clone,
{
    /// Resolves the parent (when associations are declared), then the
    /// primary resource, then its relation.
    pub fn new(
        store: &'s S,
        models: &ModelRegistry,
        config: &ResourceConfig,
        action: &str,
        params: &Value,
        path_params: &PathParams,
    ) -> Result<Self> {
        let parent_info = if config.has_associations() {
            ParentInfo::resolve(store, models, &config.belongs_to, params, path_params)?
        } else {
            None
        };
        let info = ResourceInfo::resolve(models, &config.model, params)?;
        let relation = info.relation(store, parent_info.as_ref())?;

        Ok(Self {
            store,
            action: action.to_owned(),
            kind: config.actions.kind(action),
            id: path_params.get("id").cloned(),
            info,
            parent_info,
            relation,
        })
    }

    /// Binds the parent, then materializes the instance the action works on:
    /// new actions build one in the relation from the submitted params,
    /// member actions find one in the relation by the `id` path parameter,
    /// collection actions bind nothing. An instance already bound in `ctx`
    /// is kept.
    pub fn load<C: Context<S::Record>>(&self, ctx: &mut C) -> Result<()> {
        if let Some(parent) = &self.parent_info {
            ctx.set_instance(parent.name(), parent.object().clone());
        }

        let name = self.instance_name();
        match self.kind {
            ActionKind::New if ctx.instance(name).is_none() => {
                debug!(action = %self.action, params = ?self.info.params(), "building instance");
                let instance = self.store.build(&self.relation, self.info.params())?;
                ctx.set_instance(name, instance);
            }
            ActionKind::Member if ctx.instance(name).is_none() => {
                let id = self
                    .id
                    .as_deref()
                    .ok_or_else(|| Error::MissingParameter("id".into()))?;
                debug!(action = %self.action, relation = ?self.relation, id, "finding instance");
                let instance = self.store.find(&self.relation, id)?;
                ctx.set_instance(name, instance);
            }
            _ => {}
        }

        ctx.after_load(&self.action, self.kind)
    }

    /// Authorizes the action on the bound instance, or on the model when no
    /// instance is bound, with the bound parent.
    pub fn authorize<A, C>(
        &self,
        gate: &AuthorizationGate<'_, A, S::Record>,
        ctx: &C,
        message: Option<&str>,
    ) -> Result<()>
    where
        C: Context<S::Record>,
    {
        let parent = self.parent_name().and_then(|name| ctx.instance(name));
        let target = match ctx.instance(self.instance_name()) {
            Some(instance) => Target::Instance(instance),
            None => Target::Model(self.model()),
        };
        gate.authorize(&self.action, target, parent, message)
    }

    pub fn instantiated<'c>(
        &self,
        bindings: &'c Bindings<S::Record>,
    ) -> Option<Instantiated<'c, S::Record>> {
        bindings
            .instances(self.plural_instance_name())
            .map(Instantiated::Collection)
            .or_else(|| {
                bindings
                    .instance(self.instance_name())
                    .map(Instantiated::Instance)
            })
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn model(&self) -> &ModelName {
        self.info.model()
    }

    pub fn info(&self) -> &ResourceInfo {
        &self.info
    }

    pub fn parent_info(&self) -> Option<&ParentInfo<S::Record>> {
        self.parent_info.as_ref()
    }

    pub fn relation(&self) -> &S::Relation {
        &self.relation
    }

    pub fn instance_params(&self) -> Option<&Value> {
        self.info.params()
    }

    pub fn instance_name(&self) -> &str {
        self.info.name()
    }

    pub fn plural_instance_name(&self) -> &str {
        self.info.plural_name()
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent_info.as_ref().map(Info::name)
    }
}
