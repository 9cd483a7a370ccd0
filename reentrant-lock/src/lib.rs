//! Reentrant, **upgradeable** reader-writer lock with per-owner bookkeeping.
//!
//! Every acquisition is recorded against the identity of the caller, so the
//! same thread of control can:
//!
//! - take exclusive access again while holding it (reentrant write)
//! - take shared access again while holding it (reentrant read)
//! - take exclusive access while holding shared access (in-place upgrade)
//! - take shared access while holding exclusive access (write-then-read)
//!
//! New readers wait behind any active **or pending** writer, which bounds
//! writer starvation under read-heavy load.
//!
//! # Quick Start
//!
//! ```rust
//! use reentrant_lock::Lock;
//!
//! let lock = Lock::new();
//!
//! lock.lock_shared();
//! lock.lock_shared(); // reentrant
//! lock.lock(); // upgrade: both shared levels are suspended
//! lock.lock(); // reentrant write
//! lock.unlock();
//! lock.unlock(); // shared levels are back
//! assert_eq!(lock.shared_depth(), 2);
//! lock.unlock_shared();
//! lock.unlock_shared();
//! ```
//!
//! # Guards
//!
//! ```rust
//! use reentrant_lock::Lock;
//!
//! let lock = Lock::new();
//! let read = lock.read();
//! {
//!     let _write = read.upgrade();
//!     assert!(lock.is_held_exclusively());
//! } // exclusive level released, shared level restored
//! assert_eq!(lock.shared_depth(), 1);
//! drop(read);
//!
//! let write = lock.write();
//! let read = write.downgrade(); // readers may now enter
//! assert!(!lock.is_held_exclusively());
//! # drop(read);
//! ```
//!
//! # Non-blocking variants
//!
//! [`Lock::try_lock`] and [`Lock::try_lock_shared`] return `false` where the
//! blocking calls would wait, and leave no state behind when they do.
//!
//! # Identities
//!
//! Ownership is keyed by an [`Identity`] obtained from an [`IdentitySource`].
//! [`ThreadIdentity`] (the default) gives each OS thread its own identity; any
//! `Fn() -> Identity` works for task- or fiber-based schedulers. [`RawLock`]
//! takes the identity as an argument on every call.
//!
//! ```rust
//! use reentrant_lock::{Identity, RawLock};
//!
//! let lock = RawLock::new();
//! let task = Identity::new(7).unwrap();
//! lock.lock_shared_for(task);
//! assert!(lock.try_lock_for(task)); // sole reader upgrades at once
//! assert_eq!(lock.reader_depth(task), -1);
//! lock.unlock_for(task);
//! assert_eq!(lock.reader_depth(task), 1);
//! # lock.unlock_shared_for(task);
//! ```
//!
//! # Method-scoped locking
//!
//! ```rust
//! use reentrant_lock::{locked, Lock};
//! use std::cell::Cell;
//!
//! struct Account {
//!     lock: Lock,
//!     balance: Cell<i64>,
//! }
//!
//! impl Account {
//!     #[locked(read)]
//!     fn balance(&self) -> i64 {
//!         self.balance.get()
//!     }
//!
//!     #[locked(write)]
//!     fn deposit(&self, amount: i64) -> i64 {
//!         self.balance.set(self.balance.get() + amount);
//!         self.balance() // re-enters as a read while writing
//!     }
//! }
//!
//! let account = Account { lock: Lock::new(), balance: Cell::new(0) };
//! assert_eq!(account.deposit(5), 5);
//! ```
//!
//! # Misuse
//!
//! Releasing a mode the caller does not hold is a no-op that emits a
//! `tracing` warning. [`Lock::checked_unlock`] and
//! [`Lock::checked_unlock_shared`] report it as an [`UnlockError`] instead.

mod acquire;
mod error;
mod guard;
mod identity;
mod lock;
mod maybe;
mod mode;
mod raw;

pub use acquire::AcquireLock;
pub use error::UnlockError;
pub use guard::{LockGuard, ReadGuard, WriteGuard};
pub use identity::{current_thread_identity, Identity, IdentitySource, ThreadIdentity};
pub use lock::Lock;
pub use maybe::MaybeLock;
pub use mode::{Exclusive, LockMode, LockModeKind, Shared};
pub use raw::{LockSnapshot, RawLock};
pub use reentrant_lock_derive::locked;
