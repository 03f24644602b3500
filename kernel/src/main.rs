#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]

extern crate alloc;

mod arch;
mod memory;
mod sync;
mod util;

#[cfg(not(test))]
use limine::BaseRevision;
#[cfg(not(test))]
use limine::request::FramebufferRequest;

/// Base revision supported by this kernel.
#[cfg(not(test))]
#[used]
#[link_section = ".limine_requests"]
static BASE_REVISION: BaseRevision = BaseRevision::new();

/// Request a framebuffer from the bootloader.
#[cfg(not(test))]
#[used]
#[link_section = ".limine_requests"]
static FRAMEBUFFER_REQUEST: FramebufferRequest = FramebufferRequest::new();

/// Kernel entry point called by the Limine bootloader.
#[cfg(not(test))]
#[no_mangle]
unsafe extern "C" fn _start() -> ! {
    assert!(BASE_REVISION.is_supported());

    if let Some(_framebuffer_response) = FRAMEBUFFER_REQUEST.get_response() {
        // Framebuffer is available for use
    }

    loop {
        core::arch::asm!("hlt");
    }
}
