mod builder;
pub use builder::PermissionsBuilder;

use std::{collections::HashMap, fmt, sync::Arc};

use tracing::debug;

use crate::model::{ModelName, ModelRegistry};

/// Everything a policy is constructed from for a single check.
pub struct Permit<'a, A, R> {
    pub actor: Option<&'a A>,
    pub action: &'a str,
    pub model: &'a ModelName,
    pub instance: Option<&'a R>,
    pub parent: Option<&'a R>,
}

impl<A, R> Clone for Permit<'_, A, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, R> Copy for Permit<'_, A, R> {}

impl<A, R> fmt::Debug for Permit<'_, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Permit")
            .field("actor", &self.actor.is_some())
            .field("action", &self.action)
            .field("model", &self.model)
            .field("instance", &self.instance.is_some())
            .field("parent", &self.parent.is_some())
            .finish()
    }
}

/// Authorization logic for one check.
///
/// A policy is built from the check's [`Permit`], asked once and dropped, so
/// state it keeps never outlives the check.
pub trait Policy {
    fn authorized(&self) -> bool;
}

/// Builds the policy for a model (and, through ancestry resolution, its
/// subclasses) from the permit of each check.
pub type PolicyFactory<A, R> =
    dyn for<'a> Fn(Permit<'a, A, R>) -> Box<dyn Policy + 'a> + Send + Sync;

/// Fixed decision, used as the fallback policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allowed
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allowed
        } else {
            Decision::Denied
        }
    }
}

impl Policy for Decision {
    fn authorized(&self) -> bool {
        self.is_allowed()
    }
}

/// Where a resolved policy came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    /// Registered for this ancestor of the target model.
    Model(ModelName),
    Default,
}

impl fmt::Display for PolicySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySource::Model(model) => write!(f, "policy for {}", model),
            PolicySource::Default => f.write_str("default policy"),
        }
    }
}

pub struct Resolution<'p, A, R> {
    pub source: PolicySource,
    pub factory: &'p PolicyFactory<A, R>,
}

impl<A, R> Resolution<'_, A, R> {
    /// Constructs a fresh policy for this check.
    pub fn policy<'a>(&self, permit: Permit<'a, A, R>) -> Box<dyn Policy + 'a> {
        (self.factory)(permit)
    }
}

/// Policy registry. Maps models to the factory of the policy responsible
/// for them.
///
/// Resolution walks the target's ancestry from most to least specific, so a
/// policy registered for a subclass overrides the one registered for its
/// superclass. Models without a registered ancestor fall back to the default
/// policy.
pub struct Permissions<A, R> {
    registered: HashMap<ModelName, Arc<PolicyFactory<A, R>>>,
    default: Arc<PolicyFactory<A, R>>,
}

impl<A, R> fmt::Debug for Permissions<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut models: Vec<_> = self.registered.keys().collect();
        models.sort();
        f.debug_struct("Permissions")
            .field("registered", &models)
            .finish()
    }
}

impl<A, R> Permissions<A, R> {
    pub fn builder() -> PermissionsBuilder<A, R> {
        PermissionsBuilder::new()
    }

    pub fn is_registered(&self, model: &str) -> bool {
        self.registered.contains_key(model)
    }

    /// Finds the policy factory responsible for `model`. Never fails.
    pub fn resolve(&self, models: &ModelRegistry, model: &ModelName) -> Resolution<'_, A, R> {
        let found = models.ancestors(model).into_iter().find_map(|ancestor| {
            self.registered
                .get(&ancestor)
                .map(|factory| (ancestor, factory))
        });

        let resolution = match found {
            Some((ancestor, factory)) => Resolution {
                source: PolicySource::Model(ancestor),
                factory: factory.as_ref(),
            },
            None => Resolution {
                source: PolicySource::Default,
                factory: self.default.as_ref(),
            },
        };
        debug!(%model, source = %resolution.source, "resolved policy");
        resolution
    }
}
