use autobind_core::BindingError;
use autobind_tracker::TrackerError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl HarnessError {
    /// The binding error, also when it surfaced through a tracker flush.
    #[must_use]
    pub fn binding(&self) -> Option<&BindingError> {
        match self {
            Self::Binding(err) => Some(err),
            Self::Tracker(TrackerError::Run { source, .. }) => source.downcast_ref::<BindingError>(),
            Self::Tracker(_) => None,
        }
    }
}
