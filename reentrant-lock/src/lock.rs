use std::fmt;

use crate::error::UnlockError;
use crate::guard::{ReadGuard, WriteGuard};
use crate::identity::{Identity, IdentitySource, ThreadIdentity};
use crate::raw::RawLock;

/// Reentrant, upgradeable reader-writer lock bound to an identity source.
///
/// Every operation asks `S` who the caller is and delegates to the
/// owner-keyed [`RawLock`]. With the default [`ThreadIdentity`] the owner is
/// the calling OS thread.
pub struct Lock<S = ThreadIdentity> {
    raw: RawLock,
    source: S,
}

impl Lock<ThreadIdentity> {
    /// A lock owned per OS thread. Usable in `static` items.
    pub const fn new() -> Self {
        Self::with_source(ThreadIdentity)
    }
}

impl<S> Lock<S> {
    pub const fn with_source(source: S) -> Self {
        Self {
            raw: RawLock::new(),
            source,
        }
    }

    /// The owner-keyed lock underneath, for callers that pass identities
    /// explicitly.
    #[inline]
    pub fn raw(&self) -> &RawLock {
        &self.raw
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: IdentitySource> Lock<S> {
    #[inline]
    pub fn current_owner(&self) -> Identity {
        self.source.current()
    }

    /// Acquire exclusive access, blocking until granted. Reentrant; upgrades
    /// in place when the caller holds shared access.
    #[inline]
    pub fn lock(&self) {
        self.raw.lock_for(self.current_owner());
    }

    /// Release one level of exclusive access. Ignored if the caller is not the
    /// writer.
    #[inline]
    pub fn unlock(&self) {
        self.raw.unlock_for(self.current_owner());
    }

    /// Acquire shared access, blocking while another owner writes or waits to.
    #[inline]
    pub fn lock_shared(&self) {
        self.raw.lock_shared_for(self.current_owner());
    }

    /// Release one level of shared access. Ignored if the caller holds none.
    #[inline]
    pub fn unlock_shared(&self) {
        self.raw.unlock_shared_for(self.current_owner());
    }

    #[inline]
    pub fn try_lock(&self) -> bool {
        self.raw.try_lock_for(self.current_owner())
    }

    #[inline]
    pub fn try_lock_shared(&self) -> bool {
        self.raw.try_lock_shared_for(self.current_owner())
    }

    pub fn checked_unlock(&self) -> Result<(), UnlockError> {
        self.raw.checked_unlock_for(self.current_owner())
    }

    pub fn checked_unlock_shared(&self) -> Result<(), UnlockError> {
        self.raw.checked_unlock_shared_for(self.current_owner())
    }

    pub fn read(&self) -> ReadGuard<'_> {
        self.raw.read_for(self.current_owner())
    }

    pub fn write(&self) -> WriteGuard<'_> {
        self.raw.write_for(self.current_owner())
    }

    pub fn try_read(&self) -> Option<ReadGuard<'_>> {
        self.raw.try_read_for(self.current_owner())
    }

    pub fn try_write(&self) -> Option<WriteGuard<'_>> {
        self.raw.try_write_for(self.current_owner())
    }

    /// Whether the caller is the current writer.
    #[inline]
    pub fn is_held_exclusively(&self) -> bool {
        self.raw.is_owned_by(self.current_owner())
    }

    /// The caller's entry in the reader table (negative mid-upgrade).
    pub fn shared_depth(&self) -> isize {
        self.raw.reader_depth(self.current_owner())
    }
}

impl Default for Lock<ThreadIdentity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Lock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lock").field("raw", &self.raw).finish()
    }
}
