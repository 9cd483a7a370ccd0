use crate::guard::{ReadGuard, WriteGuard};
use crate::identity::IdentitySource;
use crate::lock::Lock;
use crate::maybe::MaybeLock;

/// Anything `#[locked]` can hold for the duration of a method.
///
/// The guards are whatever releases the level on drop; the attribute never
/// touches them beyond keeping them alive.
pub trait AcquireLock {
    type Read<'a>
    where
        Self: 'a;
    type Write<'a>
    where
        Self: 'a;

    fn acquire_read(&self) -> Self::Read<'_>;
    fn acquire_write(&self) -> Self::Write<'_>;
}

impl<S: IdentitySource> AcquireLock for Lock<S> {
    type Read<'a> = ReadGuard<'a> where Self: 'a;
    type Write<'a> = WriteGuard<'a> where Self: 'a;

    #[inline]
    fn acquire_read(&self) -> Self::Read<'_> {
        self.read()
    }

    #[inline]
    fn acquire_write(&self) -> Self::Write<'_> {
        self.write()
    }
}

impl<S: IdentitySource> AcquireLock for MaybeLock<S> {
    type Read<'a> = Option<ReadGuard<'a>> where Self: 'a;
    type Write<'a> = Option<WriteGuard<'a>> where Self: 'a;

    #[inline]
    fn acquire_read(&self) -> Self::Read<'_> {
        self.read()
    }

    #[inline]
    fn acquire_write(&self) -> Self::Write<'_> {
        self.write()
    }
}
