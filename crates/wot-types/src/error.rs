//! Pass-through error for failures reported by external collaborators.

use std::error::Error;
use std::fmt;

type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// A failure reported by a collaborator (resolver, identifier, issuer,
/// reader, notification store).
///
/// Display and `source` delegate to the wrapped error, so the caller sees the
/// collaborator's message unchanged. Use [`ExternalError::downcast_ref`] to
/// recover the concrete type.
pub struct ExternalError(BoxError);

impl ExternalError {
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }

    /// Returns the wrapped error if it is of type `E`.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for ExternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ExternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for ExternalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("user not found: {0}")]
    struct Missing(String);

    #[test]
    fn message_is_passed_through_verbatim() {
        let err = ExternalError::new(Missing("dave".to_string()));
        assert_eq!(err.to_string(), "user not found: dave");
    }

    #[test]
    fn concrete_error_can_be_recovered() {
        let err = ExternalError::new(Missing("dave".to_string()));
        let inner = err.downcast_ref::<Missing>().expect("should downcast");
        assert_eq!(inner.0, "dave");
        assert!(err.downcast_ref::<std::io::Error>().is_none());
    }

    #[test]
    fn plain_strings_are_accepted() {
        let err = ExternalError::new("identify service unavailable");
        assert_eq!(err.to_string(), "identify service unavailable");
    }
}
