//! # System Controller
//!
//! The PIC pair is a single system-wide resource. [`GlobalPic`] holds the
//! one [`Pic`] the kernel drives, behind a spin lock. Every thread-side
//! accessor takes that lock with local interrupts off, so an interrupt can
//! never land on the CPU that holds it. The router side only ever
//! `try_lock`s: on another CPU the lock may still be taken, and the
//! interrupt is then dropped instead of spun on.
//!
//! A dropped interrupt must still be acknowledged or its line stays
//! in service. Once a controller with chip handles is installed, a copy of
//! the handles, the vector base and the I/O capability is published outside
//! the main lock, and the busy path sends the EOI through it.
//!
//! Handlers run after the lock is released, so a handler may register or
//! unregister handlers itself.

use core::sync::atomic::{AtomicBool, Ordering};

use spin::{Mutex, Once};

use crate::controller::{ChipHandles, Pic};
use crate::cpu::without_interrupts;
use crate::dispatch::{DispatchOutcome, Route};
use crate::error::{IoError, PicError, PicResult};
use crate::io::{offsets, PortIo};
use crate::line::{Chip, IrqLine};
use crate::regs::OCW2_EOI;

/// End-of-interrupt path usable while the controller lock is held
#[derive(Debug)]
struct EoiPath<I> {
    handles: ChipHandles,
    vector_base: u8,
    /// Only ever `try_lock`ed, from the busy path
    io: Mutex<I>,
}

impl<I: PortIo> EoiPath<I> {
    /// Returns `Ok(false)` if another CPU is using this path
    fn acknowledge(&self, line: IrqLine) -> Result<bool, IoError> {
        let Some(mut io) = self.io.try_lock() else {
            return Ok(false);
        };
        if line.is_secondary() {
            io.write_u8(self.handles.of(Chip::Secondary), offsets::COMMAND, OCW2_EOI)?;
        }
        io.write_u8(self.handles.of(Chip::Primary), offsets::COMMAND, OCW2_EOI)?;
        Ok(true)
    }
}

/// Process-wide controller slot
#[derive(Debug)]
pub struct GlobalPic<I: PortIo> {
    inner: Mutex<Option<Pic<I>>>,
    eoi: Once<EoiPath<I>>,
    /// Mirrors `Pic::is_active` of the installed controller
    active: AtomicBool,
}

impl<I: PortIo> GlobalPic<I> {
    /// Empty slot
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
            eoi: Once::new(),
            active: AtomicBool::new(false),
        }
    }
}

impl<I: PortIo + Clone> GlobalPic<I> {
    /// Install `pic` as the system controller, returning any previous one
    ///
    /// The first installed controller that carries chip handles fixes the
    /// busy-path EOI route for the lifetime of the slot.
    pub fn install(&self, pic: Pic<I>) -> Option<Pic<I>> {
        without_interrupts(|| {
            let mut guard = self.inner.lock();
            let previous = guard.replace(pic);
            self.publish(guard.as_ref());
            previous
        })
    }

    /// Remove the system controller
    pub fn take(&self) -> Option<Pic<I>> {
        without_interrupts(|| {
            let mut guard = self.inner.lock();
            let pic = guard.take();
            self.publish(None);
            pic
        })
    }

    /// Whether a controller is installed
    pub fn is_installed(&self) -> bool {
        without_interrupts(|| self.inner.lock().is_some())
    }

    /// Run `f` against the installed controller, with interrupts off
    pub fn with<R>(&self, f: impl FnOnce(&mut Pic<I>) -> R) -> PicResult<R> {
        without_interrupts(|| -> PicResult<R> {
            let mut guard = self.inner.lock();
            let pic = guard.as_mut().ok_or(PicError::NotInitialized)?;
            let result = f(pic);
            self.publish(guard.as_ref());
            Ok(result)
        })
    }

    /// Mask every line on the installed controller
    pub fn disable(&self) -> PicResult<()> {
        self.with(Pic::disable)?
    }

    /// Route one interrupt from an entry stub
    pub fn dispatch(&self, vector: u8) -> DispatchOutcome {
        let route = {
            let Some(mut guard) = self.inner.try_lock() else {
                self.acknowledge_busy(vector);
                return DispatchOutcome::Busy;
            };
            match guard.as_mut() {
                Some(pic) => pic.route(vector),
                None => Route::Complete(DispatchOutcome::Inactive),
            }
        };
        route.run()
    }

    /// Refresh the state visible to the busy path; called with the lock held
    fn publish(&self, pic: Option<&Pic<I>>) {
        let active = pic.is_some_and(Pic::is_active);
        if let Some(pic) = pic {
            if let Some(handles) = pic.handles() {
                self.eoi.call_once(|| EoiPath {
                    handles,
                    vector_base: pic.config().vector_base,
                    io: Mutex::new(pic.io().clone()),
                });
            }
        }
        self.active.store(active, Ordering::Release);
    }

    fn acknowledge_busy(&self, vector: u8) {
        let line = match self.eoi.get() {
            Some(path) if self.active.load(Ordering::Acquire) => {
                IrqLine::from_vector(vector, path.vector_base).map(|line| (path, line))
            },
            _ => None,
        };
        let Some((path, line)) = line else {
            log::warn!("PIC: Controller busy, dropping vector {:#04x}", vector);
            return;
        };

        match path.acknowledge(line) {
            Ok(true) => log::warn!("PIC: Controller busy, {} acknowledged and dropped", line),
            Ok(false) => log::warn!("PIC: Controller busy, dropping {} unacknowledged", line),
            Err(err) => log::error!("PIC: Controller busy, failed to acknowledge {}: {}", line, err),
        }
    }
}

impl<I: PortIo> Default for GlobalPic<I> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Hardware Instance
// =============================================================================

#[cfg(target_arch = "x86_64")]
pub use self::system::*;

#[cfg(target_arch = "x86_64")]
mod system {
    use super::GlobalPic;
    use crate::config::PicConfig;
    use crate::controller::Pic;
    use crate::error::PicResult;
    use crate::gates::{IrqStubs, VectorGateInstaller};
    use crate::io::{IoAddr, RawIo};

    /// The kernel's PIC pair
    pub static SYSTEM_PIC: GlobalPic<RawIo> = GlobalPic::new();

    /// Bring up the legacy PIC pair and install it as [`SYSTEM_PIC`]
    ///
    /// # Safety
    ///
    /// Must run once during early boot with interrupts disabled, at a
    /// privilege level allowed to perform port I/O. Every MMIO handle must
    /// already be mapped.
    pub unsafe fn init_system<G>(
        primary: IoAddr,
        secondary: IoAddr,
        config: PicConfig,
        gates: &mut G,
        stubs: &IrqStubs,
    ) -> PicResult<()>
    where
        G: VectorGateInstaller + ?Sized,
    {
        let mut pic = Pic::new(unsafe { RawIo::new() }, config)?;
        pic.initialize(primary, secondary, gates, stubs)?;
        SYSTEM_PIC.install(pic);
        Ok(())
    }

    /// Entry point for the per-line assembly stubs
    #[no_mangle]
    pub extern "C" fn helix_pic_dispatch(vector: u32) {
        match u8::try_from(vector) {
            Ok(vector) => {
                SYSTEM_PIC.dispatch(vector);
            },
            Err(_) => log::warn!("PIC: Vector {} out of range", vector),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::io::IoAddr;
    use crate::testing::{cmd, stubs, RecordingGates, RecordingIo};

    fn installed() -> GlobalPic<RecordingIo> {
        let mut pic = Pic::with_defaults(RecordingIo::new());
        pic.initialize(
            IoAddr::legacy_primary(),
            IoAddr::legacy_secondary(),
            &mut RecordingGates::default(),
            &stubs(),
        )
        .expect("initialize");
        let global = GlobalPic::new();
        global.install(pic);
        global
    }

    #[test]
    fn test_empty_slot() {
        let global: GlobalPic<RecordingIo> = GlobalPic::new();
        assert!(!global.is_installed());
        assert_eq!(global.dispatch(0x20), DispatchOutcome::Inactive);
        assert_eq!(global.disable(), Err(PicError::NotInitialized));
        assert_eq!(global.with(|_| ()), Err(PicError::NotInitialized));
    }

    #[test]
    fn test_dispatch_through_global() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn count() {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }

        let global = installed();
        global.with(|pic| pic.register(1, count)).expect("installed");

        assert_eq!(global.dispatch(0x21), DispatchOutcome::Handled(IrqLine::KEYBOARD));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(
            global.with(|pic| pic.stats().count(IrqLine::KEYBOARD)),
            Ok(1)
        );
    }

    #[test]
    fn test_busy_lock_drops_interrupt() {
        let global = installed();
        let guard = global.inner.lock();
        assert_eq!(global.dispatch(0x20), DispatchOutcome::Busy);
        drop(guard);
        assert_eq!(global.dispatch(0x20), DispatchOutcome::Unhandled(IrqLine::TIMER));
    }

    #[test]
    fn test_busy_dispatch_still_acknowledges() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn count() {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }

        let global = installed();
        global.with(|pic| pic.register(10, count)).expect("installed");
        let path = global.eoi.get().expect("published at install");
        path.io.lock().take();

        let guard = global.inner.lock();
        assert_eq!(global.dispatch(0x2A), DispatchOutcome::Busy);
        assert_eq!(
            path.io.lock().take(),
            vec![cmd(Chip::Secondary, 0x20), cmd(Chip::Primary, 0x20)]
        );
        assert_eq!(global.dispatch(0x21), DispatchOutcome::Busy);
        assert_eq!(path.io.lock().take(), vec![cmd(Chip::Primary, 0x20)]);
        drop(guard);

        // Dropped, not deferred
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        assert_eq!(global.with(|pic| pic.stats().total()), Ok(0));
    }

    #[test]
    fn test_busy_dispatch_skips_foreign_and_inactive() {
        let global = installed();
        let path = global.eoi.get().expect("published at install");
        path.io.lock().take();

        {
            let _guard = global.inner.lock();
            assert_eq!(global.dispatch(0x30), DispatchOutcome::Busy);
            assert_eq!(global.dispatch(0x1F), DispatchOutcome::Busy);
        }
        assert!(path.io.lock().writes.is_empty());

        global.disable().expect("disable");
        let _guard = global.inner.lock();
        assert_eq!(global.dispatch(0x20), DispatchOutcome::Busy);
        assert!(path.io.lock().writes.is_empty());
    }

    #[test]
    fn test_uninitialized_install_publishes_nothing() {
        let global = GlobalPic::new();
        global.install(Pic::with_defaults(RecordingIo::new()));
        assert!(global.eoi.get().is_none());

        global
            .with(|pic| {
                pic.initialize(
                    IoAddr::legacy_primary(),
                    IoAddr::legacy_secondary(),
                    &mut RecordingGates::default(),
                    &stubs(),
                )
            })
            .expect("installed")
            .expect("initialize");
        assert!(global.eoi.get().is_some());
        assert!(global.active.load(Ordering::SeqCst));

        global.take();
        assert!(!global.active.load(Ordering::SeqCst));
    }

    #[test]
    fn test_handler_may_touch_global() {
        static GLOBAL: GlobalPic<RecordingIo> = GlobalPic::new();
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn one_shot() {
            CALLS.fetch_add(1, Ordering::SeqCst);
            let _ = GLOBAL.with(|pic| pic.unregister(5));
        }

        let mut pic = Pic::with_defaults(RecordingIo::new());
        pic.initialize(
            IoAddr::legacy_primary(),
            IoAddr::legacy_secondary(),
            &mut RecordingGates::default(),
            &stubs(),
        )
        .expect("initialize");
        pic.register(5, one_shot);
        GLOBAL.install(pic);

        assert_eq!(GLOBAL.dispatch(0x25), DispatchOutcome::Handled(IrqLine::new(5).expect("5")));
        assert_eq!(GLOBAL.dispatch(0x25), DispatchOutcome::Unhandled(IrqLine::new(5).expect("5")));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disable_through_global() {
        let global = installed();
        global.disable().expect("disable");
        assert_eq!(global.dispatch(0x20), DispatchOutcome::Inactive);
        let pic = global.take().expect("installed");
        assert_eq!(pic.io().masks(), (0xFF, 0xFF));
    }
}
