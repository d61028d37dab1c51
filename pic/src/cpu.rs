//! Local interrupt-flag control.
//!
//! The real instructions are only issued on a bare-metal x86_64 target. A
//! hosted build (unit tests, tooling) runs at a privilege level where `cli`
//! faults, so there the closure just runs.

/// RFLAGS interrupt-enable bit
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
const RFLAGS_IF: u64 = 1 << 9;

/// Disable interrupts on the current CPU, returning whether they were enabled
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline]
fn disable() -> bool {
    let flags: u64;
    unsafe {
        core::arch::asm!(
            "pushfq",
            "pop {0}",
            "cli",
            out(reg) flags,
            options(nomem, preserves_flags),
        );
    }
    flags & RFLAGS_IF != 0
}

/// Re-enable interrupts on the current CPU
///
/// # Safety
///
/// Only valid to restore a state observed by [`disable`].
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline]
unsafe fn enable() {
    unsafe {
        core::arch::asm!("sti", options(nomem, nostack, preserves_flags));
    }
}

/// Execute a closure with interrupts disabled
///
/// Restores the previous interrupt state after the closure returns.
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
#[inline]
pub(crate) fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let was_enabled = disable();
    let result = f();
    if was_enabled {
        unsafe {
            enable();
        }
    }
    result
}

#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
#[inline]
pub(crate) fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_result_passes_through() {
        assert_eq!(without_interrupts(|| 7), 7);
        let nested = without_interrupts(|| without_interrupts(|| "inner"));
        assert_eq!(nested, "inner");
    }
}
