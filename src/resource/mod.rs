//! Resolution of the resource an action works on.
//!
//! Examples, with `Lottery::Assignment` registered and the declared
//! resource `lottery/assignments`:
//!
//! - model: `Lottery::Assignment`
//! - params: `params["lottery_assignment"]`
//! - name: `assignment`, plural name: `lottery_assignments`
//!
//! With `SecretArchive < Archive` and the declared resource `archives`, a
//! request submitting `{"secret_archive": {..}}` resolves the real model
//! `SecretArchive` while the model stays `Archive`.

mod binding;
mod info;
mod parent;

pub use binding::{Bindings, Context, Instantiated, Resource};
pub use info::ResourceInfo;
pub use parent::ParentInfo;

use std::collections::HashMap;

use serde_json::Value;

use crate::model::ModelName;

/// Path parameters extracted by routing, e.g. `{"client_id": "7", "id": "3"}`.
pub type PathParams = HashMap<String, String>;

/// A resolved subject of an action.
pub trait Info {
    /// Declared (or classified) model.
    fn model(&self) -> &ModelName;

    /// Most specific model reflected by the request.
    fn real_model(&self) -> &ModelName;

    /// Binding name in the surrounding context.
    fn name(&self) -> &str;

    /// Parameters submitted for this resource.
    fn params(&self) -> Option<&Value>;
}

fn extract(params: &Value, key: &str) -> Option<Value> {
    params.get(key).cloned()
}
