use std::{
    borrow::Borrow,
    collections::HashMap,
    fmt,
    ops::Deref,
};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{inflector, Error, Result};

/// Name of the root of the persisted model hierarchy. It and anything above
/// it never take part in policy resolution.
pub const PERSISTENCE_BASE: &str = "Base";

/// Fully qualified model name, e.g. `Lottery::Assignment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_namespaced(&self) -> bool {
        self.0.contains("::")
    }

    /// Namespace-flattened parameter key, `lottery_assignment`.
    pub fn var_name(&self) -> String {
        inflector::var_name(&self.0)
    }

    /// Parameter key with the namespace stripped, `assignment`.
    pub fn demodulized_var_name(&self) -> String {
        inflector::underscore(inflector::demodulize(&self.0))
    }
}

impl Deref for ModelName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModelName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declaration of a single model: its superclass and included mixins.
#[derive(Debug, Clone)]
pub struct ModelDef {
    name: ModelName,
    superclass: Option<ModelName>,
    mixins: Vec<ModelName>,
}

impl ModelDef {
    pub fn new(name: impl Into<ModelName>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            mixins: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: impl Into<ModelName>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn includes(mut self, mixin: impl Into<ModelName>) -> Self {
        self.mixins.push(mixin.into());
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    superclass: Option<ModelName>,
    ancestors: Vec<ModelName>,
}

/// Registered model hierarchy.
///
/// Ancestry is computed once, when a model is registered, so resolution
/// is an ordinary ranked lookup: index 0 of a model's ancestry is the model
/// itself, later entries are progressively less specific.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    base: ModelName,
    entries: HashMap<ModelName, Entry>,
    order: Vec<ModelName>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::with_base(PERSISTENCE_BASE)
    }

    pub fn with_base(base: impl Into<ModelName>) -> Self {
        Self {
            base: base.into(),
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn base(&self) -> &ModelName {
        &self.base
    }

    /// Registers a model deriving directly from the persistence base.
    pub fn register(&mut self, name: impl Into<ModelName>) -> Result<&mut Self> {
        self.register_with(ModelDef::new(name))
    }

    pub fn register_with(&mut self, def: ModelDef) -> Result<&mut Self> {
        let ModelDef {
            name,
            superclass,
            mixins,
        } = def;

        if name == self.base || self.entries.contains_key(&name) {
            return Err(Error::Validation(format!(
                "model {} is already registered",
                name
            )));
        }

        let superclass = superclass.filter(|s| *s != self.base);
        let inherited = match &superclass {
            Some(superclass) => self.known_ancestors(superclass)?,
            None => Vec::new(),
        };

        // a mixin already in the inherited chain keeps its inherited position
        let mut ancestors = vec![name.clone()];
        for mixin in mixins.iter().rev() {
            for ancestor in self.known_ancestors(mixin)? {
                if !ancestors.contains(&ancestor) && !inherited.contains(&ancestor) {
                    ancestors.push(ancestor);
                }
            }
        }
        ancestors.extend(inherited);

        trace!(model = %name, ancestors = ?ancestors, "registered model");
        self.entries.insert(
            name.clone(),
            Entry {
                superclass,
                ancestors,
            },
        );
        self.order.push(name);
        Ok(self)
    }

    fn known_ancestors(&self, name: &ModelName) -> Result<Vec<ModelName>> {
        self.entries
            .get(name)
            .map(|entry| entry.ancestors.clone())
            .ok_or_else(|| {
                Error::Validation(format!("model {} must be registered before use", name))
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Ancestry chain from most to least specific, excluding the persistence
    /// base and anything above it.
    pub fn ancestors(&self, name: &ModelName) -> Vec<ModelName> {
        if *name == self.base {
            return Vec::new();
        }
        match self.entries.get(name) {
            Some(entry) => entry.ancestors.clone(),
            None => vec![name.clone()],
        }
    }

    pub fn superclass(&self, name: &str) -> Option<&ModelName> {
        self.entries.get(name).and_then(|e| e.superclass.as_ref())
    }

    /// Whether `name` is `ancestor` or inherits from it.
    pub fn is_a(&self, name: &ModelName, ancestor: &ModelName) -> bool {
        name == ancestor
            || self
                .entries
                .get(name)
                .map_or(false, |e| e.ancestors.contains(ancestor))
    }

    /// All transitive subclasses of `name` in registration order. Mixins are
    /// not subclasses.
    pub fn descendants(&self, name: &ModelName) -> Vec<&ModelName> {
        self.order
            .iter()
            .filter(|candidate| *candidate != name && self.inherits(candidate, name))
            .collect()
    }

    fn inherits(&self, name: &ModelName, ancestor: &ModelName) -> bool {
        let mut current = self.superclass(name);
        while let Some(superclass) = current {
            if superclass == ancestor {
                return true;
            }
            current = self.superclass(superclass);
        }
        false
    }

    /// Resolves an identifier (`"accounts"`, `"lottery/assignments"`,
    /// `"Client"`) into a registered model.
    pub fn classify(&self, identifier: &str) -> Result<ModelName> {
        if self.contains(identifier) {
            return Ok(ModelName::new(identifier));
        }
        let name = inflector::classify(identifier);
        if self.contains(&name) {
            Ok(ModelName::new(name))
        } else {
            Err(Error::Unclassifiable(identifier.to_owned()))
        }
    }
}
