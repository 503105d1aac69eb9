use thiserror::Error;

/// Errors returned by fallible `ProbeMap` accessors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// The requested key has no entry. Returned by `at`/`at_mut`, which
    /// never modify the map on failure.
    #[error("key not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, MapError>;
