//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they need to.  Nothing on the per-tick or per-decision path
//! returns an error; only configuration and editing APIs do.

use thiserror::Error;

/// The base error type for `pw-core` and a common ancestor for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("settings parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Shorthand result type for `pw-core`.
pub type CoreResult<T> = Result<T, CoreError>;
