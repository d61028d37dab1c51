//! # Interrupt Entry Router
//!
//! Every hardware interrupt funnels through here. The entry stub has already
//! resolved the vector number; the router turns it into a line, sends the
//! end-of-interrupt and runs the registered handler.
//!
//! ```text
//!   stub(vector) ──► route ──┬─ inactive ──────────────► Inactive
//!                            ├─ vector not ours ───────► OutOfRange (no EOI)
//!                            └─ line = vector - base
//!                                   │
//!                               acknowledge(line)
//!                                   │
//!                            handler? ──yes──► handler() ──► Handled
//!                                   └──no──────────────────► Unhandled
//! ```
//!
//! The router runs with interrupts off on a suspended instruction stream.
//! It never blocks and never propagates a failure.

use crate::controller::{Pic, PicState};
use crate::io::PortIo;
use crate::line::{IrqLine, NUM_LINES};
use crate::table::IrqHandler;

// =============================================================================
// Outcome
// =============================================================================

/// What happened to one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Acknowledged and handed to the registered handler
    Handled(IrqLine),
    /// Acknowledged; no handler registered, interrupt dropped
    Unhandled(IrqLine),
    /// Vector outside the sixteen lines; nothing acknowledged
    OutOfRange(u8),
    /// Controller not active; nothing touched
    Inactive,
    /// Controller unavailable (lock held elsewhere); interrupt dropped
    Busy,
}

/// Routing decision, split from handler invocation so the handler can run
/// after any lock around the controller is released
#[derive(Debug, Clone, Copy)]
pub enum Route {
    /// Acknowledged; run `handler`
    Dispatch {
        /// Line that fired
        line: IrqLine,
        /// Registered handler
        handler: IrqHandler,
    },
    /// Nothing left to run
    Complete(DispatchOutcome),
}

impl Route {
    /// Run the handler, if any, and report the outcome
    #[inline]
    pub fn run(self) -> DispatchOutcome {
        match self {
            Route::Dispatch { line, handler } => {
                handler();
                DispatchOutcome::Handled(line)
            },
            Route::Complete(outcome) => outcome,
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Dispatch counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrqStats {
    /// Interrupts routed per line, handled or not
    pub per_line: [u64; NUM_LINES],
    /// Routed interrupts with no registered handler
    pub unhandled: u64,
    /// Vectors that did not belong to any line
    pub out_of_range: u64,
    /// End-of-interrupt writes that failed
    pub ack_failures: u64,
}

impl IrqStats {
    /// Zeroed counters
    pub const fn new() -> Self {
        Self {
            per_line: [0; NUM_LINES],
            unhandled: 0,
            out_of_range: 0,
            ack_failures: 0,
        }
    }

    /// Interrupts routed on `line`
    #[inline]
    pub fn count(&self, line: IrqLine) -> u64 {
        self.per_line[line.index()]
    }

    /// Interrupts routed across all lines
    pub fn total(&self) -> u64 {
        self.per_line.iter().sum()
    }
}

// =============================================================================
// Router
// =============================================================================

impl<I: PortIo> Pic<I> {
    /// Route one interrupt: acknowledge it and run its handler
    pub fn handle_interrupt(&mut self, vector: u8) -> DispatchOutcome {
        self.route(vector).run()
    }

    /// Resolve and acknowledge `vector` without running the handler
    pub fn route(&mut self, vector: u8) -> Route {
        if self.state != PicState::Active {
            return Route::Complete(DispatchOutcome::Inactive);
        }

        let Some(line) = IrqLine::from_vector(vector, self.config.vector_base) else {
            self.stats.out_of_range += 1;
            log::warn!("PIC: Unexpected vector {:#04x}, not acknowledged", vector);
            return Route::Complete(DispatchOutcome::OutOfRange(vector));
        };

        if cfg!(feature = "debug") || line != IrqLine::TIMER {
            log::trace!("PIC: {:?} (vector {:#04x})", line, vector);
        }

        self.stats.per_line[line.index()] += 1;

        if let Err(err) = self.acknowledge(line) {
            self.stats.ack_failures += 1;
            log::error!("PIC: Failed to acknowledge {}: {}", line, err);
        }

        match self.table.get(line) {
            Some(handler) => Route::Dispatch { line, handler },
            None => {
                self.stats.unhandled += 1;
                Route::Complete(DispatchOutcome::Unhandled(line))
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
