//! Error Types for the Expert Panel

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PanelError>;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result of {0} is not a finite number")]
    NotFinite(String),

    #[error("invalid ingredient: {0}")]
    InvalidIngredient(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl From<PanelError> for AgentError {
    fn from(err: PanelError) -> Self {
        match err {
            PanelError::Agent(inner) => inner,
            other => AgentError::ToolValidation(other.to_string()),
        }
    }
}
