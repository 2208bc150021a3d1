use std::fmt;

use thiserror::Error;

use crate::model::ModelName;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", .message.as_deref().unwrap_or("You are not authorized to access this page."))]
    AccessDenied {
        message: Option<String>,
        action: String,
        subject: Subject,
    },

    #[error("Couldn't find {model} with id={id}.")]
    NotFound { model: ModelName, id: String },

    #[error("Unable to classify {0} into a registered model.")]
    Unclassifiable(String),

    #[error("{model} has no association or accessor named {name}.")]
    UnknownAssociation { model: ModelName, name: String },

    #[error("Required parameter {0} is missing.")]
    MissingParameter(String),

    #[error("An error occurred deserializing resource configuration.")]
    Deserializing(#[source] serde_json::Error),

    #[error("An error occurred validating configuration: {0}.")]
    Validation(String),
}

impl Error {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Error::AccessDenied { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// What an access decision was made about: a bare model (collection and
/// creation contexts) or a concrete instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Model(ModelName),
    Instance { model: ModelName, id: Option<String> },
}

impl Subject {
    pub fn model(&self) -> &ModelName {
        match self {
            Subject::Model(model) | Subject::Instance { model, .. } => model,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Model(model) => write!(f, "{}", model),
            Subject::Instance {
                model,
                id: Some(id),
            } => write!(f, "{}#{}", model, id),
            Subject::Instance { model, id: None } => write!(f, "new {}", model),
        }
    }
}
