/// Marker: the guard holds one level of shared access.
pub struct Shared;

/// Marker: the guard holds one level of exclusive access.
pub struct Exclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockModeKind {
    Shared,
    Exclusive,
}

pub trait LockMode {
    const MODE: LockModeKind;
}

impl LockMode for Shared {
    const MODE: LockModeKind = LockModeKind::Shared;
}

impl LockMode for Exclusive {
    const MODE: LockModeKind = LockModeKind::Exclusive;
}
