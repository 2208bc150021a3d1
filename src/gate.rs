use tracing::{debug, trace};

use crate::{
    errors::Subject,
    model::{ModelName, ModelRegistry},
    policy::{Decision, Permissions, Permit, PolicySource},
    store::Record,
    Error, Result,
};

/// Model hierarchy plus the policies registered against it. Immutable
/// once built and shared by every unit of work.
#[derive(Debug)]
pub struct Authorization<A, R> {
    models: ModelRegistry,
    permissions: Permissions<A, R>,
}

impl<A, R> Authorization<A, R> {
    pub fn new(models: ModelRegistry, permissions: Permissions<A, R>) -> Self {
        Self {
            models,
            permissions,
        }
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn permissions(&self) -> &Permissions<A, R> {
        &self.permissions
    }

    /// Opens a gate for one unit of work, acting as `actor`.
    pub fn gate(&self, actor: Option<A>) -> AuthorizationGate<'_, A, R> {
        AuthorizationGate {
            authorization: self,
            actor,
        }
    }
}

/// What an action is performed on.
#[derive(Debug)]
pub enum Target<'a, R> {
    /// Collection and creation contexts.
    Model(&'a ModelName),
    /// Member contexts. The model is the instance's runtime model.
    Instance(&'a R),
}

impl<'a, R: Record> Target<'a, R> {
    pub fn model(&self) -> &'a ModelName {
        match *self {
            Target::Model(model) => model,
            Target::Instance(instance) => instance.model(),
        }
    }

    pub fn instance(&self) -> Option<&'a R> {
        match *self {
            Target::Model(_) => None,
            Target::Instance(instance) => Some(instance),
        }
    }

    pub fn subject(&self) -> Subject {
        match *self {
            Target::Model(model) => Subject::Model(model.clone()),
            Target::Instance(instance) => Subject::Instance {
                model: instance.model().clone(),
                id: instance.id().map(str::to_owned),
            },
        }
    }
}

impl<R> Clone for Target<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Target<'_, R> {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub decision: Decision,
    pub action: String,
    pub subject: Subject,
    pub reason: Option<String>,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }

    /// Converts a denial into [`Error::AccessDenied`], carrying `message`.
    pub fn into_result(self, message: Option<&str>) -> Result<()> {
        match self.decision {
            Decision::Allowed => Ok(()),
            Decision::Denied => Err(Error::AccessDenied {
                message: message.map(str::to_owned),
                action: self.action,
                subject: self.subject,
            }),
        }
    }
}

/// Authorization entry point for one unit of work (typically one request).
///
/// The gate owns the current actor, so concurrent units of work, each with
/// their own gate, never observe each other's actor.
#[derive(Debug)]
pub struct AuthorizationGate<'a, A, R> {
    authorization: &'a Authorization<A, R>,
    actor: Option<A>,
}

impl<'a, A, R: Record> AuthorizationGate<'a, A, R> {
    pub fn new(authorization: &'a Authorization<A, R>) -> Self {
        authorization.gate(None)
    }

    /// Replaces the current actor.
    pub fn set_actor(&mut self, actor: A) {
        self.actor = Some(actor);
    }

    pub fn current_actor(&self) -> Option<&A> {
        self.actor.as_ref()
    }

    pub fn authorization(&self) -> &'a Authorization<A, R> {
        self.authorization
    }

    /// Resolves the policy for the target's model, constructs it for this
    /// check and asks it once.
    pub fn evaluate(&self, action: &str, target: Target<'_, R>, parent: Option<&R>) -> AccessDecision {
        let model = target.model();
        let resolution = self
            .authorization
            .permissions
            .resolve(&self.authorization.models, model);

        let permit = Permit {
            actor: self.actor.as_ref(),
            action,
            model,
            instance: target.instance(),
            parent,
        };
        let policy = resolution.policy(permit);
        let decision = Decision::from(policy.authorized());
        trace!(?permit, ?decision, "evaluated policy");

        let reason = match &resolution.source {
            PolicySource::Model(source) => format!("decided by policy for {}", source),
            PolicySource::Default => "decided by default policy".to_owned(),
        };
        AccessDecision {
            decision,
            action: action.to_owned(),
            subject: target.subject(),
            reason: Some(reason),
        }
    }

    pub fn is_authorized(&self, action: &str, target: Target<'_, R>, parent: Option<&R>) -> bool {
        self.evaluate(action, target, parent).is_allowed()
    }

    /// Like [`is_authorized`](Self::is_authorized), but a denial is returned
    /// as [`Error::AccessDenied`] carrying `message`, the action and the
    /// subject.
    pub fn authorize(
        &self,
        action: &str,
        target: Target<'_, R>,
        parent: Option<&R>,
        message: Option<&str>,
    ) -> Result<()> {
        let decision = self.evaluate(action, target, parent);
        if !decision.is_allowed() {
            debug!(
                action,
                subject = %decision.subject,
                reason = decision.reason.as_deref().unwrap_or_default(),
                "access denied"
            );
        }
        decision.into_result(message)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;
    use crate::{memory::MemoryRecord, model::tests::registry, policy::Policy};
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct User {
        admin: bool,
    }

    type UserPermit<'a> = Permit<'a, User, MemoryRecord>;

    struct AccountPolicy<'a> {
        permit: UserPermit<'a>,
    }

    impl Policy for AccountPolicy<'_> {
        fn authorized(&self) -> bool {
            match self.permit.action {
                "index" | "show" => true,
                _ => self.permit.actor.map_or(false, |u| u.admin),
            }
        }
    }

    fn authorization() -> Authorization<User, MemoryRecord> {
        let permissions = Permissions::<User, MemoryRecord>::builder()
            .with_policy("Account", |permit| Box::new(AccountPolicy { permit }))
            .with_policy("Client", |permit| {
                Box::new(Decision::from(
                    permit.instance.is_some() && permit.parent.is_none(),
                ))
            })
            .build();
        Authorization::new(registry(), permissions)
    }

    /// Allows only the first question asked of the same instance.
    struct OneShotPolicy {
        asked: Cell<u32>,
    }

    impl Policy for OneShotPolicy {
        fn authorized(&self) -> bool {
            self.asked.set(self.asked.get() + 1);
            self.asked.get() == 1
        }
    }

    #[test]
    fn policy_is_constructed_for_every_check() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let permissions = Permissions::<User, MemoryRecord>::builder()
            .with_policy("Account", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::new(OneShotPolicy {
                    asked: Cell::new(0),
                })
            })
            .build();
        let authorization = Authorization::new(registry(), permissions);
        let account = ModelName::from("Account");

        let first = authorization.gate(Some(User { admin: false }));
        let second = authorization.gate(Some(User { admin: false }));
        assert!(first.is_authorized("show", Target::Model(&account), None));
        assert!(second.is_authorized("show", Target::Model(&account), None));
        assert!(second.is_authorized("show", Target::Model(&account), None));
        assert_eq!(3, built.load(Ordering::SeqCst));
        assert!(authorization.permissions().is_registered("Account"));
        assert!(authorization.models().contains("Account"));
    }

    #[test]
    fn actor_is_replaced_not_appended() {
        let authorization = authorization();
        let mut gate = AuthorizationGate::new(&authorization);
        assert_eq!(None, gate.current_actor());

        gate.set_actor(User { admin: false });
        gate.set_actor(User { admin: true });
        assert_eq!(Some(&User { admin: true }), gate.current_actor());
    }

    #[test]
    fn decision_follows_actor_and_action() {
        let authorization = authorization();
        let account = ModelName::from("Account");
        let mut gate = authorization.gate(Some(User { admin: false }));

        assert!(gate.is_authorized("show", Target::Model(&account), None));
        assert!(!gate.is_authorized("destroy", Target::Model(&account), None));

        gate.set_actor(User { admin: true });
        assert!(gate.is_authorized("destroy", Target::Model(&account), None));
    }

    #[test]
    fn instance_target_uses_runtime_model() {
        let authorization = authorization();
        let gate = authorization.gate(None);
        let secret = MemoryRecord::new("SecretAccount", "2");

        let decision = gate.evaluate("show", Target::Instance(&secret), None);
        assert!(decision.is_allowed());
        assert_eq!(
            Subject::Instance {
                model: "SecretAccount".into(),
                id: Some("2".into())
            },
            decision.subject
        );
        assert_eq!(
            Some("decided by policy for Account"),
            decision.reason.as_deref()
        );
    }

    #[test]
    fn parent_and_instance_reach_permission() {
        let authorization = authorization();
        let gate = authorization.gate(None);
        let client = MemoryRecord::new("Client", "7");
        let vip = MemoryRecord::new("VipClient", "8");
        let client_model = ModelName::from("Client");

        assert!(gate.is_authorized("show", Target::Instance(&vip), None));
        assert!(!gate.is_authorized("show", Target::Instance(&vip), Some(&client)));
        assert!(!gate.is_authorized("index", Target::Model(&client_model), None));
    }

    #[test]
    fn authorize_raises_access_denied_with_message() {
        let authorization = authorization();
        let gate = authorization.gate(None);
        let account = MemoryRecord::new("Account", "1");
        let expected = Subject::Instance {
            model: "Account".into(),
            id: Some("1".into()),
        };

        assert!(gate
            .authorize("show", Target::Instance(&account), None, None)
            .is_ok());
        assert_matches!(
            gate.authorize("update", Target::Instance(&account), None, Some("read only")),
            Err(Error::AccessDenied { message: Some(message), action, subject })
                if message == "read only" && action == "update" && subject == expected
        );
    }

    #[test]
    fn denied_message_defaults() {
        let authorization = authorization();
        let gate = authorization.gate(None);
        let prize = ModelName::from("Lottery::Prize");

        let err = gate
            .authorize("index", Target::Model(&prize), None, None)
            .unwrap_err();
        assert!(err.is_access_denied());
        assert!(!err.is_not_found());
        assert_eq!("You are not authorized to access this page.", err.to_string());
    }

    #[test]
    fn concurrent_gates_are_isolated() {
        let authorization = Arc::new(authorization());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [false, true]
            .iter()
            .map(|&admin| {
                let authorization = Arc::clone(&authorization);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let account = ModelName::from("Account");
                    let mut gate = authorization.gate(None);
                    gate.set_actor(User { admin });
                    barrier.wait();
                    (0..100)
                        .map(|_| gate.is_authorized("destroy", Target::Model(&account), None))
                        .all(|allowed| allowed == admin)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    proptest! {
        #[test]
        fn authorize_fails_iff_not_authorized(admin in any::<bool>(), action in "[a-z]{1,8}") {
            let authorization = authorization();
            let gate = authorization.gate(Some(User { admin }));
            let account = ModelName::from("Account");

            let first = gate.is_authorized(&action, Target::Model(&account), None);
            let second = gate.is_authorized(&action, Target::Model(&account), None);
            prop_assert_eq!(first, second);

            let result = gate.authorize(&action, Target::Model(&account), None, None);
            prop_assert_eq!(first, result.is_ok());
        }
    }
}
