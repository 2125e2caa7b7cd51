use thiserror::Error;

/// Error type user computations return from their run function.
pub type BoxError = Box<dyn std::error::Error + 'static>;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("computation {computation_id} failed")]
    Run {
        computation_id: u64,
        #[source]
        source: BoxError,
    },

    #[error("flush called while a flush is already running")]
    ReentrantFlush,

    #[error("flush called from inside a running computation")]
    FlushInCompute,
}

impl TrackerError {
    /// Id of the failing computation, when the error came from a run.
    #[must_use]
    pub fn computation_id(&self) -> Option<u64> {
        match self {
            Self::Run { computation_id, .. } => Some(*computation_id),
            _ => None,
        }
    }

    /// Consume the error and return the run function's own error, if any.
    #[must_use]
    pub fn into_run_source(self) -> Option<BoxError> {
        match self {
            Self::Run { source, .. } => Some(source),
            _ => None,
        }
    }
}
