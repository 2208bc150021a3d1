//! Resource resolution and policy dispatch for request-scoped authorization.
//!
//! For every action the crate answers two questions: what the action works
//! on (the primary resource, its real subclass, and the parent it is nested
//! under), and which [`Policy`] decides whether the current actor may do it.
//! Policy factories are registered per model and resolved along the model's
//! ancestry, falling back to a default. A policy is constructed for every
//! check and dropped once it has answered.
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::return_self_not_must_use
)]
mod config;
mod errors;
mod gate;
pub mod inflector;
mod memory;
mod model;
mod policy;
mod resource;
mod store;

pub use config::{ActionKind, Actions, Association, AssociationTarget, ResourceConfig};
pub use errors::{Error, Result, Subject};
pub use gate::{AccessDecision, Authorization, AuthorizationGate, Target};
pub use memory::{MemoryRecord, MemoryRelation, MemoryStore};
pub use model::{ModelDef, ModelName, ModelRegistry, PERSISTENCE_BASE};
pub use policy::{
    Decision, Permissions, PermissionsBuilder, Permit, Policy, PolicyFactory, PolicySource,
    Resolution,
};
pub use resource::{
    Bindings, Context, Info, Instantiated, ParentInfo, PathParams, Resource, ResourceInfo,
};
pub use store::{Record, Store};
