//! Repository error type

use crate::store::{ErrorKind, StoreError};
use thiserror::Error;

/// A store failure annotated with the repository operation that hit it
#[derive(Debug, Error)]
#[error("{op}: {source}")]
pub struct RepoError {
    pub op: &'static str,
    #[source]
    pub source: StoreError,
}

impl RepoError {
    pub fn new(op: &'static str, source: StoreError) -> Self {
        RepoError { op, source }
    }

    /// Adapter for `map_err`
    pub(crate) fn at(op: &'static str) -> impl FnOnce(StoreError) -> RepoError {
        move |source| RepoError::new(op, source)
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
