//! Fallible heap-node allocation.
//!
//! `Box::new` aborts the process (via the allocation-error handler) on
//! OOM, which is wrong here: every out-of-memory condition, heap or
//! frame, needs to come back as an ordinary `Result`. Stable Rust has no
//! fallible `Box::try_new` outside the nightly allocator API, so this
//! allocates through the raw global allocator and checks for a null
//! pointer before taking ownership, the same workaround used by most
//! `no_std` kernels that need a recoverable heap-OOM path.

use alloc::boxed::Box;
use core::alloc::Layout;

use super::error::VmError;

/// Allocates `value` on the heap, reporting `VmError::OutOfMemory` instead
/// of aborting if the allocator cannot satisfy the request.
pub fn try_box_new<T>(value: T) -> Result<Box<T>, VmError> {
    let layout = Layout::new::<T>();
    if layout.size() == 0 {
        return Ok(Box::new(value));
    }

    // SAFETY: `layout` is non-zero-sized and correctly describes `T`; the
    // returned pointer is checked for null before any access, and is only
    // written through and handed to `Box::from_raw` once known non-null.
    unsafe {
        let ptr = alloc::alloc::alloc(layout) as *mut T;
        if ptr.is_null() {
            return Err(VmError::OutOfMemory);
        }
        ptr.write(value);
        Ok(Box::from_raw(ptr))
    }
}
