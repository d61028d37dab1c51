//! # IRQ Dispatch Table
//!
//! Sixteen slots, one per line, each empty or holding one handler. The
//! table never grows. Out-of-range line numbers are tolerated: they are
//! rejected without touching any slot and without raising an error.

use crate::line::{IrqLine, NUM_LINES};

/// IRQ handler, run in interrupt context after the line is acknowledged
///
/// Handlers must not block and must return promptly.
pub type IrqHandler = fn();

/// Result of a registration attempt
#[derive(Debug, Clone, Copy)]
pub enum Registration {
    /// The slot was empty
    Installed,
    /// The slot held a handler, which has been replaced
    Replaced(IrqHandler),
    /// The line number is out of range; nothing changed
    Rejected,
}

// Handlers compare by code address.
impl PartialEq for Registration {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Registration::Replaced(a), Registration::Replaced(b)) => {
                handler_addr(*a) == handler_addr(*b)
            },
            (Registration::Installed, Registration::Installed)
            | (Registration::Rejected, Registration::Rejected) => true,
            _ => false,
        }
    }
}

impl Eq for Registration {}

#[inline]
fn handler_addr(handler: IrqHandler) -> usize {
    handler as *const () as usize
}

impl Registration {
    /// Whether the handler now occupies its slot
    #[inline]
    pub const fn is_installed(&self) -> bool {
        !matches!(self, Registration::Rejected)
    }
}

/// Fixed-size handler registry indexed by line
#[derive(Debug, Clone)]
pub struct IrqTable {
    slots: [Option<IrqHandler>; NUM_LINES],
}

impl IrqTable {
    /// Create an empty table
    pub const fn new() -> Self {
        Self {
            slots: [None; NUM_LINES],
        }
    }

    /// Install `handler` on `line`, replacing any previous handler
    pub fn register(&mut self, line: u8, handler: IrqHandler) -> Registration {
        let Some(line) = IrqLine::new(line) else {
            return Registration::Rejected;
        };

        match self.slots[line.index()].replace(handler) {
            Some(previous) => Registration::Replaced(previous),
            None => Registration::Installed,
        }
    }

    /// Install `handler` on `line`, returning `false` if the line is out of range
    #[inline]
    pub fn try_register(&mut self, line: u8, handler: IrqHandler) -> bool {
        self.register(line, handler).is_installed()
    }

    /// Clear the slot for `line`, returning what it held
    ///
    /// Out-of-range lines are ignored and yield `None`.
    pub fn unregister(&mut self, line: u8) -> Option<IrqHandler> {
        IrqLine::new(line).and_then(|line| self.slots[line.index()].take())
    }

    /// Handler registered for `line`
    #[inline]
    pub fn handler(&self, line: u8) -> Option<IrqHandler> {
        IrqLine::new(line).and_then(|line| self.get(line))
    }

    /// Handler registered for a validated line
    #[inline]
    pub fn get(&self, line: IrqLine) -> Option<IrqHandler> {
        self.slots[line.index()]
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether every slot is empty
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Clear every slot
    pub fn clear(&mut self) {
        self.slots = [None; NUM_LINES];
    }

    /// Iterate over occupied slots
    pub fn iter(&self) -> impl Iterator<Item = (IrqLine, IrqHandler)> + '_ {
        IrqLine::all().filter_map(|line| self.get(line).map(|handler| (line, handler)))
    }
}

impl Default for IrqTable {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
