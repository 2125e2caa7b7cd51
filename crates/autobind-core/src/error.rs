use thiserror::Error;

/// Error type user callbacks (cleanups, engine runs) report failures with.
pub type BoxError = Box<dyn std::error::Error + 'static>;

pub type Result<T> = std::result::Result<T, BindingError>;

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("cleanup callback failed")]
    Cleanup(#[source] BoxError),

    #[error("reactive engine failed")]
    Engine(#[source] BoxError),

    #[error("binding has no value: the reactive function never completed a run")]
    NoValue,
}

impl BindingError {
    #[must_use]
    pub fn is_cleanup(&self) -> bool {
        matches!(self, Self::Cleanup(_))
    }

    /// Recover a binding error that travelled through the engine boxed, or
    /// wrap a foreign one as [`BindingError::Engine`].
    #[must_use]
    pub fn from_engine(err: BoxError) -> Self {
        match err.downcast::<BindingError>() {
            Ok(own) => *own,
            Err(other) => Self::Engine(other),
        }
    }
}
