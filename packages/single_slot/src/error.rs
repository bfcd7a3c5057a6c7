use thiserror::Error;

/// Errors that can occur when constructing the instance held by a slot.
///
/// Construction failure is the only recoverable condition in the slot
/// lifecycle; every precondition violation (creating into an occupied slot,
/// accessing an empty one) is a caller bug and panics instead. After a
/// construction failure the slot remains empty, so a subsequent create call
/// is legal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConstructError {
    /// The caller-supplied constructor ran but did not produce an instance.
    #[error("the supplied constructor did not produce an instance")]
    NoInstance,
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(ConstructError: Send, Sync, Debug);

    #[test]
    fn no_instance_is_error() {
        let error = ConstructError::NoInstance;

        // Verify it is a valid Error that can be used in Result context.
        let result: Result<(), ConstructError> = Err(error);
        assert!(result.is_err());
    }

    #[test]
    fn display_names_the_constructor() {
        let message = ConstructError::NoInstance.to_string();
        assert!(message.contains("constructor"));
    }
}
