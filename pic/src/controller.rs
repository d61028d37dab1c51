//! # Controller
//!
//! [`Pic`] owns everything the driver needs: the I/O capability, the two
//! chip handles, the dispatch table and the statistics. Nothing is kept in
//! hidden statics; the process-wide instance lives in [`crate::global`].
//!
//! ## Lifecycle
//!
//! ```text
//!   Uninitialized ──initialize()──► Active ──disable()──► Disabled
//!         ▲                           ▲                      │
//!         └── remap failed            └─────initialize()─────┘
//! ```
//!
//! Acknowledge and routing are inert outside `Active`.

use crate::config::PicConfig;
use crate::dispatch::IrqStats;
use crate::error::{PicError, PicResult};
use crate::gates::{install_gates, IrqStubs, VectorGateInstaller};
use crate::io::{offsets, IoAddr, PortIo};
use crate::line::{Chip, IrqLine};
use crate::regs::{self, MASK_ALL, OCW2_EOI};
use crate::table::{IrqHandler, IrqTable, Registration};

// =============================================================================
// State
// =============================================================================

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PicState {
    /// No successful initialization yet (or the last one failed)
    Uninitialized,
    /// Remapped, gates installed, routing live
    Active,
    /// All lines masked; remap left in place
    Disabled,
}

/// Register blocks of the two chips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipHandles {
    /// Primary (master) chip
    pub primary: IoAddr,
    /// Secondary (slave) chip
    pub secondary: IoAddr,
}

impl ChipHandles {
    /// Handle for `chip`
    #[inline]
    pub const fn of(&self, chip: Chip) -> IoAddr {
        match chip {
            Chip::Primary => self.primary,
            Chip::Secondary => self.secondary,
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Cascaded 8259 pair
#[derive(Debug)]
pub struct Pic<I: PortIo> {
    pub(crate) io: I,
    pub(crate) config: PicConfig,
    pub(crate) handles: Option<ChipHandles>,
    pub(crate) state: PicState,
    pub(crate) table: IrqTable,
    pub(crate) stats: IrqStats,
}

impl<I: PortIo> Pic<I> {
    /// Create a controller over `io`
    ///
    /// Nothing is written to hardware until [`Pic::initialize`].
    pub fn new(io: I, config: PicConfig) -> PicResult<Self> {
        config.validate()?;
        Ok(Self {
            io,
            config,
            handles: None,
            state: PicState::Uninitialized,
            table: IrqTable::new(),
            stats: IrqStats::new(),
        })
    }

    /// Create a controller with the default vector base
    pub fn with_defaults(io: I) -> Self {
        match Self::new(io, PicConfig::default()) {
            Ok(pic) => pic,
            // DEFAULT_VECTOR_BASE is checked at compile time
            Err(_) => unreachable!("default vector base rejected"),
        }
    }

    // -------------------------------------------------------------------------
    // Initialization
    // -------------------------------------------------------------------------

    /// Program both chips and wire the sixteen gates
    ///
    /// Stores the handles, sends the four initialization words to each chip,
    /// then installs one gate per line. If any write fails the controller is
    /// left `Uninitialized`, no gate is installed and the fault is returned;
    /// a half-programmed PIC is a fatal boot condition for the caller.
    pub fn initialize<G>(
        &mut self,
        primary: IoAddr,
        secondary: IoAddr,
        gates: &mut G,
        stubs: &IrqStubs,
    ) -> PicResult<()>
    where
        G: VectorGateInstaller + ?Sized,
    {
        log::info!(
            "PIC: Setting up 8259 pair [primary: {:?}, secondary: {:?}]",
            primary,
            secondary
        );

        self.handles = Some(ChipHandles { primary, secondary });
        self.state = PicState::Uninitialized;

        if let Err(err) = self.remap() {
            log::error!("PIC: Remap aborted: {}", err);
            return Err(err);
        }

        install_gates(gates, self.config.vector_base, stubs);
        self.state = PicState::Active;

        log::info!(
            "PIC: Lines remapped to vectors {:#04x}-{:#04x}",
            self.config.primary_base(),
            self.config.secondary_base() + 7
        );
        Ok(())
    }

    /// Send ICW1-ICW4 to both chips, interleaved
    fn remap(&mut self) -> PicResult<()> {
        // ICW1: begin initialization
        self.write(Chip::Primary, offsets::COMMAND, regs::ICW1.bits())?;
        self.wait();
        self.write(Chip::Secondary, offsets::COMMAND, regs::ICW1.bits())?;
        self.wait();

        // ICW2: vector bases
        self.write(Chip::Primary, offsets::DATA, self.config.primary_base())?;
        self.wait();
        self.write(Chip::Secondary, offsets::DATA, self.config.secondary_base())?;
        self.wait();

        // ICW3: cascade wiring
        self.write(Chip::Primary, offsets::DATA, regs::PRIMARY_ICW3)?;
        self.wait();
        self.write(Chip::Secondary, offsets::DATA, regs::SECONDARY_ICW3)?;
        self.wait();

        // ICW4: 8086 mode
        self.write(Chip::Primary, offsets::DATA, regs::ICW4.bits())?;
        self.wait();
        self.write(Chip::Secondary, offsets::DATA, regs::ICW4.bits())?;
        self.wait();

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Acknowledge
    // -------------------------------------------------------------------------

    /// Send end-of-interrupt for `line`
    ///
    /// A line on the secondary chip holds the primary's cascade input until
    /// the secondary is acknowledged, so the secondary goes first. The
    /// primary is acknowledged in every case. Does nothing unless active.
    pub fn acknowledge(&mut self, line: IrqLine) -> PicResult<()> {
        if self.state != PicState::Active {
            return Ok(());
        }

        if line.is_secondary() {
            self.write(Chip::Secondary, offsets::COMMAND, OCW2_EOI)?;
        }
        self.write(Chip::Primary, offsets::COMMAND, OCW2_EOI)
    }

    // -------------------------------------------------------------------------
    // Line masking
    // -------------------------------------------------------------------------

    /// Stop `line` from raising interrupts
    pub fn mask(&mut self, line: IrqLine) -> PicResult<()> {
        self.ensure_active()?;
        let chip = line.chip();
        let mask = self.read(chip, offsets::DATA)? | line.chip_bit();
        self.write(chip, offsets::DATA, mask)?;
        log::debug!("PIC: Masked {:?}", line);
        Ok(())
    }

    /// Let `line` raise interrupts
    ///
    /// Lines on the secondary chip also need the cascade input open.
    pub fn unmask(&mut self, line: IrqLine) -> PicResult<()> {
        self.ensure_active()?;
        let chip = line.chip();
        let mask = self.read(chip, offsets::DATA)? & !line.chip_bit();
        self.write(chip, offsets::DATA, mask)?;

        if line.is_secondary() {
            let primary = self.read(Chip::Primary, offsets::DATA)?;
            let cascade = IrqLine::CASCADE.chip_bit();
            if primary & cascade != 0 {
                self.write(Chip::Primary, offsets::DATA, primary & !cascade)?;
            }
        }

        log::debug!("PIC: Unmasked {:?}", line);
        Ok(())
    }

    /// Current mask registers as `(primary, secondary)`
    pub fn masks(&mut self) -> PicResult<(u8, u8)> {
        self.ensure_active()?;
        let primary = self.read(Chip::Primary, offsets::DATA)?;
        let secondary = self.read(Chip::Secondary, offsets::DATA)?;
        Ok((primary, secondary))
    }

    // -------------------------------------------------------------------------
    // Shutdown
    // -------------------------------------------------------------------------

    /// Mask all sixteen lines
    ///
    /// Used when the APIC takes over. The remap stays in place and the
    /// handles are kept; routing and acknowledge go inert until the next
    /// [`Pic::initialize`]. Safe to call repeatedly.
    pub fn disable(&mut self) -> PicResult<()> {
        if self.handles.is_none() {
            return Err(PicError::NotInitialized);
        }

        self.state = PicState::Disabled;
        self.write(Chip::Secondary, offsets::DATA, MASK_ALL)?;
        self.write(Chip::Primary, offsets::DATA, MASK_ALL)?;

        log::info!("PIC: All lines masked");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Dispatch table
    // -------------------------------------------------------------------------

    /// Install `handler` on `line`, replacing any previous handler
    pub fn register(&mut self, line: u8, handler: IrqHandler) -> Registration {
        let result = self.table.register(line, handler);
        match result {
            Registration::Replaced(_) => log::warn!("PIC: Handler for IRQ{} replaced", line),
            Registration::Rejected => log::debug!("PIC: Ignoring handler for IRQ{}", line),
            Registration::Installed => {},
        }
        result
    }

    /// Install `handler` on `line`, returning `false` if the line is out of range
    pub fn try_register(&mut self, line: u8, handler: IrqHandler) -> bool {
        self.register(line, handler).is_installed()
    }

    /// Clear the handler for `line`; out-of-range lines are ignored
    pub fn unregister(&mut self, line: u8) -> Option<IrqHandler> {
        self.table.unregister(line)
    }

    /// Handler registered for `line`
    pub fn handler(&self, line: u8) -> Option<IrqHandler> {
        self.table.handler(line)
    }

    /// The dispatch table
    pub fn table(&self) -> &IrqTable {
        &self.table
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Lifecycle state
    #[inline]
    pub fn state(&self) -> PicState {
        self.state
    }

    /// Whether routing is live
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == PicState::Active
    }

    /// Configuration
    #[inline]
    pub fn config(&self) -> &PicConfig {
        &self.config
    }

    /// Stored chip handles
    #[inline]
    pub fn handles(&self) -> Option<ChipHandles> {
        self.handles
    }

    /// Dispatch statistics
    #[inline]
    pub fn stats(&self) -> &IrqStats {
        &self.stats
    }

    /// Zero the dispatch statistics
    pub fn reset_stats(&mut self) {
        self.stats = IrqStats::new();
    }

    /// The I/O capability
    pub fn io(&self) -> &I {
        &self.io
    }

    /// Release the I/O capability
    pub fn into_io(self) -> I {
        self.io
    }

    // -------------------------------------------------------------------------
    // Register access
    // -------------------------------------------------------------------------

    fn ensure_active(&self) -> PicResult<()> {
        match self.state {
            PicState::Active => Ok(()),
            PicState::Disabled => Err(PicError::NotActive),
            PicState::Uninitialized => Err(PicError::NotInitialized),
        }
    }

    fn write(&mut self, chip: Chip, offset: u16, value: u8) -> PicResult<()> {
        let handles = self.handles.ok_or(PicError::NotInitialized)?;
        self.io.write_u8(handles.of(chip), offset, value)?;
        Ok(())
    }

    fn read(&mut self, chip: Chip, offset: u16) -> PicResult<u8> {
        let handles = self.handles.ok_or(PicError::NotInitialized)?;
        Ok(self.io.read_u8(handles.of(chip), offset)?)
    }

    #[inline]
    fn wait(&mut self) {
        if self.config.io_delay {
            self.io.io_wait();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
