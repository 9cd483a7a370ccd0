use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque key naming the logical thread of control that owns a lock level.
///
/// Zero is never a valid identity, so the current writer fits in a single
/// atomic word with `0` meaning "no writer".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(NonZeroU64);

impl Identity {
    /// Returns `None` for `0`.
    #[inline]
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    #[inline]
    pub const fn from_non_zero(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<NonZeroU64> for Identity {
    fn from(raw: NonZeroU64) -> Self {
        Self(raw)
    }
}

/// Supplies the identity of the caller.
///
/// Two calls from the same logical thread of control must return equal
/// identities; calls from different ones must not. The lock never inspects
/// an identity beyond comparing it.
pub trait IdentitySource {
    fn current(&self) -> Identity;
}

/// One identity per OS thread, assigned on first use and never reused.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ThreadIdentity;

impl IdentitySource for ThreadIdentity {
    #[inline]
    fn current(&self) -> Identity {
        current_thread_identity()
    }
}

impl<F> IdentitySource for F
where
    F: Fn() -> Identity,
{
    #[inline]
    fn current(&self) -> Identity {
        self()
    }
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: Identity = {
        let raw = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        // wrapping to 0 takes 2^64 threads
        Identity::new(raw).unwrap_or(Identity(NonZeroU64::MAX))
    };
}

/// Identity of the calling OS thread.
#[inline]
pub fn current_thread_identity() -> Identity {
    THREAD_ID.with(|id| *id)
}
