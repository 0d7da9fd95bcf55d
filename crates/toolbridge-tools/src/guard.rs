//! Process-wide write policy.

use crate::errors::ToolError;

/// Global switch gating every mutating tool. Fixed at startup.
///
/// The default is closed: mutating tools fail with
/// [`ToolError::WriteDisabled`] before any upstream call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteGuard {
    allow_writes: bool,
}

impl WriteGuard {
    /// Create a guard with the given policy.
    pub const fn new(allow_writes: bool) -> Self {
        Self { allow_writes }
    }

    /// A guard that rejects all writes.
    pub const fn closed() -> Self {
        Self::new(false)
    }

    /// A guard that permits writes.
    pub const fn open() -> Self {
        Self::new(true)
    }

    /// Whether mutating tools may proceed.
    pub const fn is_write_allowed(self) -> bool {
        self.allow_writes
    }

    /// Return `Err(WriteDisabled)` unless writes are allowed.
    pub fn ensure_writable(self) -> Result<(), ToolError> {
        if self.allow_writes {
            Ok(())
        } else {
            Err(ToolError::WriteDisabled)
        }
    }
}
