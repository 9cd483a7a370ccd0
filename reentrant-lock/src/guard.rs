use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;

use crate::identity::Identity;
use crate::mode::{Exclusive, LockMode, LockModeKind, Shared};
use crate::raw::RawLock;

/// One level of access held by `owner`, released on drop.
///
/// - `LockGuard<'a, Shared>` ([`ReadGuard`]) can [`upgrade`](LockGuard::upgrade)
///   in place to exclusive access
/// - `LockGuard<'a, Exclusive>` ([`WriteGuard`]) can
///   [`downgrade`](LockGuard::downgrade) to shared access
///
/// Guards are `!Send`: a thread identity must release on the thread that
/// acquired.
#[must_use = "the lock level is released as soon as the guard is dropped"]
pub struct LockGuard<'a, M: LockMode> {
    lock: &'a RawLock,
    owner: Identity,
    _mode: PhantomData<(M, *const ())>,
}

pub type ReadGuard<'a> = LockGuard<'a, Shared>;
pub type WriteGuard<'a> = LockGuard<'a, Exclusive>;

impl<'a, M: LockMode> LockGuard<'a, M> {
    /// The level must already be acquired for `owner`.
    #[inline(always)]
    pub(crate) fn new(lock: &'a RawLock, owner: Identity) -> Self {
        Self {
            lock,
            owner,
            _mode: PhantomData,
        }
    }

    #[inline(always)]
    pub fn owner(&self) -> Identity {
        self.owner
    }

    #[inline(always)]
    pub fn mode(&self) -> LockModeKind {
        M::MODE
    }
}

// --- Upgrade: Shared -> Exclusive (blocks until foreign readers drain) ---
impl<'a> LockGuard<'a, Shared> {
    /// Upgrade to exclusive access without giving up this shared level.
    ///
    /// The returned guard borrows `self`, so the shared level outlives the
    /// exclusive one and is restored when the write guard drops.
    pub fn upgrade(&self) -> WriteGuard<'_> {
        self.lock.lock_for(self.owner);
        LockGuard::new(self.lock, self.owner)
    }

    /// Non-blocking [`upgrade`](Self::upgrade). Returns `None` if another
    /// owner holds shared or exclusive access.
    pub fn try_upgrade(&self) -> Option<WriteGuard<'_>> {
        self.lock
            .try_lock_for(self.owner)
            .then(|| LockGuard::new(self.lock, self.owner))
    }
}

// --- Downgrade: Exclusive -> Shared (never blocks) ---
impl<'a> LockGuard<'a, Exclusive> {
    /// Trade this exclusive level for a shared one.
    ///
    /// If this was the outermost exclusive level, other readers are admitted
    /// immediately; otherwise the shared level rides along until the
    /// enclosing exclusive levels are released.
    pub fn downgrade(self) -> ReadGuard<'a> {
        let this = ManuallyDrop::new(self);
        this.lock.lock_shared_for(this.owner);
        this.lock.unlock_for(this.owner);
        LockGuard::new(this.lock, this.owner)
    }
}

impl<M: LockMode> Drop for LockGuard<'_, M> {
    fn drop(&mut self) {
        match M::MODE {
            LockModeKind::Shared => self.lock.unlock_shared_for(self.owner),
            LockModeKind::Exclusive => self.lock.unlock_for(self.owner),
        }
    }
}

impl<M: LockMode> fmt::Debug for LockGuard<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("owner", &self.owner)
            .field("mode", &M::MODE)
            .finish()
    }
}
