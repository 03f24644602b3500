//! Error kinds for the virtual memory core.
//!
//! Plain enum, no `thiserror`/`anyhow` — this matches the error style
//! already used by this crate's hardware paging layer (`memory::vmm`'s
//! `MapError`/`UnmapError`), which is a hand-written enum with a derived
//! `Debug` and no external error-handling crate.

/// POSIX-flavoured errno values the original trap dispatcher expects.
const ENOMEM: i32 = 12;
const EFAULT: i32 = 14;
const EINVAL: i32 = 22;

/// Failure reported by an operation on the virtual memory core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum VmError {
    /// Heap or frame allocator exhausted, or an overlapping region request.
    OutOfMemory,
    /// Null preconditions failed, no region covers a fault, or a write hit
    /// a read-only mapping.
    BadAddress,
    /// Unrecognized fault type.
    InvalidArgument,
}

impl VmError {
    /// The errno value a trap dispatcher would report to the faulting
    /// process for this failure.
    pub const fn errno(self) -> i32 {
        match self {
            VmError::OutOfMemory => ENOMEM,
            VmError::BadAddress => EFAULT,
            VmError::InvalidArgument => EINVAL,
        }
    }
}

pub type VmResult<T> = Result<T, VmError>;
