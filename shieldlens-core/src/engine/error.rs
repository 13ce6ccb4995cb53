use crate::aggregate::AggregateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("a previous refresh panicked while holding the refresh lock")]
    RefreshLockPoisoned,
}
