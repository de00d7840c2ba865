use thiserror::Error;

use pw_core::CoreError;
use pw_rules::RuleError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    /// The call came from a thread other than the simulation thread.  Nothing
    /// was changed.
    #[error("{0} called from outside the simulation thread")]
    WrongThread(&'static str),

    #[error("parking policy engine has been disposed")]
    Disposed,
}

pub type EngineResult<T> = Result<T, EngineError>;
