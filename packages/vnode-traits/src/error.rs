//! Error type shared by every vnode stream

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced on node and snapshot streams.
///
/// Nothing in vnode catches these. An error ends the stream it is yielded on.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A component, deferred value or source stream failed
    #[error("Source failed: {0}")]
    Source(#[source] BoxError),
    /// A hydration hook failed
    #[error("Hydration failed: {0}")]
    Hydrate(#[source] BoxError),
    /// Sources nested deeper than the configured limit, usually because a source contains itself
    #[error("Source nesting exceeded the depth limit of {limit}")]
    DepthExceeded { limit: usize },
}

impl Error {
    pub fn source_failed(err: impl Into<BoxError>) -> Self {
        Self::Source(err.into())
    }

    pub fn hydration_failed(err: impl Into<BoxError>) -> Self {
        Self::Hydrate(err.into())
    }
}

#[test]
fn test_error_display() {
    let err = Error::source_failed("component exploded");
    assert_eq!(err.to_string(), "Source failed: component exploded");

    let err = Error::DepthExceeded { limit: 8 };
    assert_eq!(
        err.to_string(),
        "Source nesting exceeded the depth limit of 8"
    );
}

#[test]
fn test_error_keeps_source() {
    use std::error::Error as _;

    let err = Error::hydration_failed(std::io::Error::other("detached"));
    assert_eq!(err.source().map(|e| e.to_string()), Some("detached".into()));
}
