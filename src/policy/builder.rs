use std::{collections::HashMap, sync::Arc};

use crate::{
    model::ModelName,
    policy::{Decision, Permissions, Permit, Policy, PolicyFactory},
};

pub struct PermissionsBuilder<A, R> {
    registered: HashMap<ModelName, Arc<PolicyFactory<A, R>>>,
    default: Option<Arc<PolicyFactory<A, R>>>,
    default_decision: Decision,
}

impl<A, R> Default for PermissionsBuilder<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> PermissionsBuilder<A, R> {
    pub fn new() -> Self {
        Self {
            registered: HashMap::new(),
            default: None,
            default_decision: Decision::Denied,
        }
    }

    /// Registers the policy for `model`. `factory` is called once per check
    /// with that check's permit. Registering the same model twice keeps the
    /// last policy.
    pub fn with_policy<F>(mut self, model: impl Into<ModelName>, factory: F) -> Self
    where
        F: for<'a> Fn(Permit<'a, A, R>) -> Box<dyn Policy + 'a> + Send + Sync + 'static,
    {
        self.registered.insert(model.into(), shared(factory));
        self
    }

    /// Registers a fixed decision for `model`.
    pub fn with_decision(self, model: impl Into<ModelName>, decision: Decision) -> Self {
        self.with_policy(model, move |_| Box::new(decision))
    }

    /// Policy used for models with no registered ancestor.
    pub fn with_default<F>(mut self, factory: F) -> Self
    where
        F: for<'a> Fn(Permit<'a, A, R>) -> Box<dyn Policy + 'a> + Send + Sync + 'static,
    {
        self.default = Some(shared(factory));
        self
    }

    /// Fixed decision used as the default policy when none was given
    /// through [`with_default`](Self::with_default).
    pub fn with_default_decision(mut self, decision: Decision) -> Self {
        self.default_decision = decision;
        self
    }

    pub fn build(self) -> Permissions<A, R> {
        let default: Arc<PolicyFactory<A, R>> = match self.default {
            Some(factory) => factory,
            None => {
                let decision = self.default_decision;
                shared(move |_| Box::new(decision))
            }
        };
        Permissions {
            registered: self.registered,
            default,
        }
    }
}

fn shared<A, R, F>(factory: F) -> Arc<PolicyFactory<A, R>>
where
    F: for<'a> Fn(Permit<'a, A, R>) -> Box<dyn Policy + 'a> + Send + Sync + 'static,
{
    Arc::new(factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::tests::registry,
        policy::{tests::User, PolicySource},
    };

    fn permit<'a>(model: &'a ModelName, action: &'a str) -> Permit<'a, User, ()> {
        Permit {
            actor: None,
            action,
            model,
            instance: None,
            parent: None,
        }
    }

    #[test]
    fn custom_default_wins_over_default_decision() {
        let models = registry();
        let permissions = PermissionsBuilder::<User, ()>::new()
            .with_default_decision(Decision::Denied)
            .with_default(|permit| Box::new(Decision::from(permit.action == "index")))
            .build();

        let model = ModelName::from("Lottery::Prize");
        let resolution = permissions.resolve(&models, &model);
        assert_eq!(PolicySource::Default, resolution.source);
        assert!(resolution.policy(permit(&model, "index")).authorized());
        assert!(!resolution.policy(permit(&model, "destroy")).authorized());
    }

    #[test]
    fn re_registering_replaces_policy() {
        let permissions = PermissionsBuilder::<User, ()>::new()
            .with_decision("Account", Decision::Denied)
            .with_decision("Account", Decision::Allowed)
            .build();
        let models = registry();
        let model = ModelName::from("Account");

        assert!(permissions.is_registered("Account"));
        assert!(permissions
            .resolve(&models, &model)
            .policy(permit(&model, "destroy"))
            .authorized());
    }
}
