use crate::identity::Identity;

/// Returned by the checked release operations when the caller does not hold
/// the mode it tries to release.
///
/// The unchecked [`unlock`](crate::Lock::unlock) and
/// [`unlock_shared`](crate::Lock::unlock_shared) treat the same situation as a
/// no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnlockError {
    #[error("owner {owner} does not hold exclusive access")]
    NotWriter { owner: Identity },
    #[error("owner {owner} does not hold shared access")]
    NotReader { owner: Identity },
}
