/// The access mode a caller wants on a page. `ReadOnly` maps to a shared
/// lock, `ReadWrite` to an exclusive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Shared,
    Exclusive,
}

impl Permission {
    pub fn lock_kind(&self) -> LockKind {
        match self {
            Permission::ReadOnly => LockKind::Shared,
            Permission::ReadWrite => LockKind::Exclusive,
        }
    }
}
