//! Owner-keyed reader-writer state machine.
//!
//! [`RawLock`] takes the owner [`Identity`] as an explicit argument on every
//! operation. [`Lock`](crate::Lock) binds it to an
//! [`IdentitySource`](crate::IdentitySource) so callers never pass one by hand.
//!
//! # Bookkeeping
//!
//! Everything except the writer role lives behind one internal mutex:
//!
//! | Field             | Meaning                                                  |
//! |-------------------|----------------------------------------------------------|
//! | `readers[x] > 0`  | `x` holds that many levels of shared access              |
//! | `readers[x] < 0`  | `x` upgraded; `-readers[x]` levels come back on release  |
//! | `active_readers`  | sum of the positive entries, used for writer admission   |
//! | `pending_writers` | owners blocked in [`RawLock::lock_for`]                  |
//!
//! The writer identity, its depth and the shared levels it took while
//! exclusive are atomics, so the owner can re-enter without the mutex.
//!
//! # Writer preference
//!
//! A new reader waits while any writer is active or pending. Owners that
//! already hold shared access re-enter without waiting, so a pending writer
//! never deadlocks against a reader that nests its reads.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};
use tracing::{trace, warn};

use crate::error::UnlockError;
use crate::guard::{LockGuard, ReadGuard, WriteGuard};
use crate::identity::Identity;

const NO_WRITER: u64 = 0;

struct State {
    readers: BTreeMap<Identity, isize>,
    active_readers: usize,
    pending_writers: usize,
}

impl State {
    const fn new() -> Self {
        Self {
            readers: BTreeMap::new(),
            active_readers: 0,
            pending_writers: 0,
        }
    }

    fn shared_depth(&self, owner: Identity) -> usize {
        match self.readers.get(&owner) {
            Some(&depth) if depth > 0 => depth.unsigned_abs(),
            _ => 0,
        }
    }

    fn reenter_shared(&mut self, owner: Identity) -> bool {
        match self.readers.get_mut(&owner) {
            Some(depth) if *depth > 0 => {
                *depth += 1;
                self.active_readers += 1;
                true
            }
            _ => false,
        }
    }

    fn admit_shared(&mut self, owner: Identity) {
        self.readers.insert(owner, 1);
        self.active_readers += 1;
    }

    /// Removes the owner's shared levels from the admission count.
    fn suspend_shared(&mut self, owner: Identity) -> Option<usize> {
        let depth = self.shared_depth(owner);
        if depth == 0 {
            return None;
        }
        self.readers.remove(&owner);
        self.active_readers -= depth;
        Some(depth)
    }

    fn release_shared(&mut self, owner: Identity) -> bool {
        match self.readers.get_mut(&owner) {
            Some(depth) if *depth > 0 => {
                *depth -= 1;
                if *depth == 0 {
                    self.readers.remove(&owner);
                }
                self.active_readers -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Point-in-time copy of a lock's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSnapshot {
    pub writer: Option<Identity>,
    pub writer_depth: usize,
    /// Shared levels taken by the writer while it holds exclusive access.
    pub writer_reads: usize,
    pub readers: BTreeMap<Identity, isize>,
    pub active_readers: usize,
    pub pending_writers: usize,
}

impl LockSnapshot {
    /// The signed `readers` entry for `owner`, `0` when absent.
    pub fn reader_depth(&self, owner: Identity) -> isize {
        self.readers.get(&owner).copied().unwrap_or(0)
    }
}

/// Reentrant, upgradeable reader-writer lock keyed by explicit owner identity.
pub struct RawLock {
    writer: AtomicU64,
    writer_depth: AtomicUsize,
    writer_reads: AtomicUsize,
    state: Mutex<State>,
    write_possible: Condvar,
    read_possible: Condvar,
}

impl RawLock {
    pub const fn new() -> Self {
        Self {
            writer: AtomicU64::new(NO_WRITER),
            writer_depth: AtomicUsize::new(0),
            writer_reads: AtomicUsize::new(0),
            state: parking_lot::const_mutex(State::new()),
            write_possible: Condvar::new(),
            read_possible: Condvar::new(),
        }
    }

    #[inline]
    fn is_writer(&self, owner: Identity) -> bool {
        self.writer.load(Ordering::Acquire) == owner.get()
    }

    #[inline]
    fn has_writer(&self) -> bool {
        self.writer.load(Ordering::Acquire) != NO_WRITER
    }

    #[inline]
    fn reenter_exclusive(&self, owner: Identity) -> bool {
        if self.is_writer(owner) {
            self.writer_depth.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Caller must hold the state mutex.
    fn install_writer(&self, owner: Identity) {
        self.writer_depth.store(1, Ordering::Relaxed);
        self.writer_reads.store(0, Ordering::Relaxed);
        self.writer.store(owner.get(), Ordering::Release);
    }

    /// Acquires exclusive access for `owner`, blocking until it is granted.
    ///
    /// Re-entering only bumps the depth. An owner holding shared access is
    /// upgraded in place: its shared levels stop counting against admission
    /// while it waits for foreign readers to drain, and come back when its
    /// last exclusive level is released.
    pub fn lock_for(&self, owner: Identity) {
        if self.reenter_exclusive(owner) {
            return;
        }

        let mut state = self.state.lock();
        // The writer role may have changed while we waited for the mutex.
        if self.reenter_exclusive(owner) {
            return;
        }

        state.pending_writers += 1;
        let upgraded = state.suspend_shared(owner);

        if state.active_readers > 0 || self.has_writer() {
            trace!(
                owner = %owner,
                upgrade = upgraded.is_some(),
                active_readers = state.active_readers,
                "waiting for exclusive access"
            );
            while state.active_readers > 0 || self.has_writer() {
                self.write_possible.wait(&mut state);
            }
        }

        self.install_writer(owner);
        if let Some(depth) = upgraded {
            state.readers.insert(owner, -(depth as isize));
            trace!(owner = %owner, suspended = depth, "upgraded shared access");
        }
        state.pending_writers -= 1;
    }

    /// Non-blocking [`lock_for`](Self::lock_for).
    ///
    /// The owner's own shared levels never count against its upgrade.
    pub fn try_lock_for(&self, owner: Identity) -> bool {
        if self.reenter_exclusive(owner) {
            return true;
        }

        let mut state = self.state.lock();
        if self.reenter_exclusive(owner) {
            return true;
        }

        let foreign_readers = state.active_readers - state.shared_depth(owner);
        if foreign_readers > 0 || self.has_writer() {
            return false;
        }

        let upgraded = state.suspend_shared(owner);
        self.install_writer(owner);
        if let Some(depth) = upgraded {
            state.readers.insert(owner, -(depth as isize));
        }
        true
    }

    fn release_exclusive(&self, owner: Identity) -> bool {
        if !self.is_writer(owner) {
            return false;
        }

        let mut state = self.state.lock();
        if !self.is_writer(owner) {
            return false;
        }
        if self.writer_depth.fetch_sub(1, Ordering::Relaxed) > 1 {
            return true;
        }

        let suspended = match state.readers.get(&owner) {
            Some(&depth) if depth < 0 => depth.unsigned_abs(),
            _ => 0,
        };
        let retained = suspended + self.writer_reads.swap(0, Ordering::Relaxed);
        self.writer.store(NO_WRITER, Ordering::Release);

        if retained > 0 {
            state.readers.insert(owner, retained as isize);
            state.active_readers += retained;
            trace!(owner = %owner, retained, "released exclusive access, shared access kept");
            self.read_possible.notify_all();
            self.write_possible.notify_all();
        } else if state.pending_writers > 0 {
            self.write_possible.notify_one();
        } else {
            self.read_possible.notify_all();
        }
        true
    }

    /// Releases one level of exclusive access. A no-op when `owner` is not the
    /// writer.
    pub fn unlock_for(&self, owner: Identity) {
        if !self.release_exclusive(owner) {
            warn!(owner = %owner, "unlock without exclusive access ignored");
        }
    }

    pub fn checked_unlock_for(&self, owner: Identity) -> Result<(), UnlockError> {
        if self.release_exclusive(owner) {
            Ok(())
        } else {
            Err(UnlockError::NotWriter { owner })
        }
    }

    /// Acquires shared access for `owner`, blocking while any other writer is
    /// active or pending.
    ///
    /// The current writer gets shared levels for free; they are tracked apart
    /// from the reader table and turn into ordinary shared access if still
    /// held when the writer fully releases.
    pub fn lock_shared_for(&self, owner: Identity) {
        if self.is_writer(owner) {
            self.writer_reads.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut state = self.state.lock();
        if state.reenter_shared(owner) {
            return;
        }

        if state.pending_writers > 0 || self.has_writer() {
            trace!(
                owner = %owner,
                pending_writers = state.pending_writers,
                "waiting for shared access"
            );
            while state.pending_writers > 0 || self.has_writer() {
                self.read_possible.wait(&mut state);
            }
        }
        state.admit_shared(owner);
    }

    /// Non-blocking [`lock_shared_for`](Self::lock_shared_for).
    pub fn try_lock_shared_for(&self, owner: Identity) -> bool {
        if self.is_writer(owner) {
            self.writer_reads.fetch_add(1, Ordering::Relaxed);
            return true;
        }

        let mut state = self.state.lock();
        if state.reenter_shared(owner) {
            return true;
        }
        if state.pending_writers > 0 || self.has_writer() {
            return false;
        }
        state.admit_shared(owner);
        true
    }

    fn release_shared(&self, owner: Identity) -> bool {
        if self.is_writer(owner) {
            return self
                .writer_reads
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
                .is_ok();
        }

        let mut state = self.state.lock();
        if !state.release_shared(owner) {
            return false;
        }
        if state.active_readers == 0 && state.pending_writers > 0 {
            self.write_possible.notify_one();
        }
        true
    }

    /// Releases one level of shared access. A no-op when `owner` holds none.
    pub fn unlock_shared_for(&self, owner: Identity) {
        if !self.release_shared(owner) {
            warn!(owner = %owner, "unlock_shared without shared access ignored");
        }
    }

    pub fn checked_unlock_shared_for(&self, owner: Identity) -> Result<(), UnlockError> {
        if self.release_shared(owner) {
            Ok(())
        } else {
            Err(UnlockError::NotReader { owner })
        }
    }

    pub fn read_for(&self, owner: Identity) -> ReadGuard<'_> {
        self.lock_shared_for(owner);
        LockGuard::new(self, owner)
    }

    pub fn write_for(&self, owner: Identity) -> WriteGuard<'_> {
        self.lock_for(owner);
        LockGuard::new(self, owner)
    }

    pub fn try_read_for(&self, owner: Identity) -> Option<ReadGuard<'_>> {
        self.try_lock_shared_for(owner)
            .then(|| LockGuard::new(self, owner))
    }

    pub fn try_write_for(&self, owner: Identity) -> Option<WriteGuard<'_>> {
        self.try_lock_for(owner).then(|| LockGuard::new(self, owner))
    }

    /// Whether anyone holds exclusive or shared access.
    pub fn is_locked(&self) -> bool {
        let state = self.state.lock();
        self.has_writer() || state.active_readers > 0
    }

    pub fn is_locked_exclusive(&self) -> bool {
        self.has_writer()
    }

    /// Whether `owner` currently holds exclusive access.
    #[inline]
    pub fn is_owned_by(&self, owner: Identity) -> bool {
        self.is_writer(owner)
    }

    /// The signed reader-table entry for `owner`; negative while an upgrade
    /// has its shared levels suspended.
    pub fn reader_depth(&self, owner: Identity) -> isize {
        self.state.lock().readers.get(&owner).copied().unwrap_or(0)
    }

    pub fn active_readers(&self) -> usize {
        self.state.lock().active_readers
    }

    pub fn pending_writers(&self) -> usize {
        self.state.lock().pending_writers
    }

    pub fn snapshot(&self) -> LockSnapshot {
        let state = self.state.lock();
        let writer = Identity::new(self.writer.load(Ordering::Acquire));
        let (writer_depth, writer_reads) = match writer {
            Some(_) => (
                self.writer_depth.load(Ordering::Relaxed),
                self.writer_reads.load(Ordering::Relaxed),
            ),
            None => (0, 0),
        };
        LockSnapshot {
            writer,
            writer_depth,
            writer_reads,
            readers: state.readers.clone(),
            active_readers: state.active_readers,
            pending_writers: state.pending_writers,
        }
    }
}

impl Default for RawLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RawLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("RawLock")
            .field("writer", &snapshot.writer)
            .field("writer_depth", &snapshot.writer_depth)
            .field("readers", &snapshot.readers)
            .field("active_readers", &snapshot.active_readers)
            .field("pending_writers", &snapshot.pending_writers)
            .finish()
    }
}
