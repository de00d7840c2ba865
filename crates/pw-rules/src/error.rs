use thiserror::Error;

use pw_core::BuildingId;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("cannot attach a parking rule to {0}")]
    InvalidBuilding(BuildingId),
}

pub type RuleResult<T> = Result<T, RuleError>;
