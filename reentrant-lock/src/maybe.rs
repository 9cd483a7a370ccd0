use crate::guard::{ReadGuard, WriteGuard};
use crate::identity::{IdentitySource, ThreadIdentity};
use crate::lock::Lock;

/// A [`Lock`] that can be switched off at construction.
///
/// Containers that are sometimes shared across threads and sometimes not keep
/// one code path: every operation forwards to the inner lock when
/// synchronized and does nothing otherwise. Unsynchronized `try_` calls
/// always succeed.
#[derive(Debug)]
pub struct MaybeLock<S = ThreadIdentity> {
    inner: Option<Lock<S>>,
}

impl MaybeLock<ThreadIdentity> {
    pub const fn new(synchronized: bool) -> Self {
        if synchronized {
            Self::synchronized()
        } else {
            Self::unsynchronized()
        }
    }

    pub const fn synchronized() -> Self {
        Self {
            inner: Some(Lock::new()),
        }
    }
}

impl<S> MaybeLock<S> {
    pub const fn unsynchronized() -> Self {
        Self { inner: None }
    }

    pub const fn with_source(source: S) -> Self {
        Self {
            inner: Some(Lock::with_source(source)),
        }
    }

    #[inline]
    pub fn is_synchronized(&self) -> bool {
        self.inner.is_some()
    }

    pub fn as_lock(&self) -> Option<&Lock<S>> {
        self.inner.as_ref()
    }
}

impl<S: IdentitySource> MaybeLock<S> {
    #[inline]
    pub fn lock(&self) {
        if let Some(lock) = &self.inner {
            lock.lock();
        }
    }

    #[inline]
    pub fn unlock(&self) {
        if let Some(lock) = &self.inner {
            lock.unlock();
        }
    }

    #[inline]
    pub fn lock_shared(&self) {
        if let Some(lock) = &self.inner {
            lock.lock_shared();
        }
    }

    #[inline]
    pub fn unlock_shared(&self) {
        if let Some(lock) = &self.inner {
            lock.unlock_shared();
        }
    }

    #[inline]
    pub fn try_lock(&self) -> bool {
        self.inner.as_ref().map_or(true, Lock::try_lock)
    }

    #[inline]
    pub fn try_lock_shared(&self) -> bool {
        self.inner.as_ref().map_or(true, Lock::try_lock_shared)
    }

    /// `None` when unsynchronized.
    pub fn read(&self) -> Option<ReadGuard<'_>> {
        self.inner.as_ref().map(Lock::read)
    }

    /// `None` when unsynchronized.
    pub fn write(&self) -> Option<WriteGuard<'_>> {
        self.inner.as_ref().map(Lock::write)
    }
}

impl Default for MaybeLock<ThreadIdentity> {
    fn default() -> Self {
        Self::synchronized()
    }
}
