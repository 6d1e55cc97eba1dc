//! Error types. Kept out of the `no_std` core: `thiserror`'s derive needs
//! `std::error::Error`, and the only operation in this crate that returns a
//! `Result` at all is [`crate::resource::Resource::close`], which the
//! `std`-gated `OsResource` implements.
#![cfg(feature = "std")]

use thiserror::Error;

/// Error returned by [`crate::resource::Resource::close`] when the backend
/// fails to release the underlying store.
///
/// The only information callers get back is a human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to close resource: {0}")]
pub struct CloseError(pub String);

impl CloseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
