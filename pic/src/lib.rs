//! # Helix Legacy PIC
//!
//! Driver for the cascaded pair of 8259 Programmable Interrupt Controllers
//! found on every PC-compatible x86 system. It is used when no APIC is
//! available, and shut down once one takes over.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Legacy PIC Driver                             │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │   Boot ──► Pic::initialize ──► ICW1-4 to both chips ──► 16 gates    │
//! │                                                                      │
//! │   Drivers ──► register / unregister ──► IrqTable[16]                │
//! │                                                                      │
//! │   IRQ ──► entry stub ──► route(vector)                              │
//! │                              │                                       │
//! │                    acknowledge(line) ── EOI secondary, then primary  │
//! │                              │                                       │
//! │                         handler()                                    │
//! │                                                                      │
//! │   APIC up ──► Pic::disable ──► mask all lines                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use helix_pic::{IoAddr, PicConfig, SYSTEM_PIC};
//!
//! unsafe {
//!     helix_pic::init_system(
//!         IoAddr::legacy_primary(),
//!         IoAddr::legacy_secondary(),
//!         PicConfig::default(),
//!         &mut idt,
//!         &IRQ_STUBS,
//!     )?;
//! }
//!
//! SYSTEM_PIC.with(|pic| pic.register(1, keyboard_irq))?;
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod config;
pub mod controller;
mod cpu;
pub mod dispatch;
pub mod error;
pub mod gates;
pub mod global;
pub mod io;
pub mod line;
pub mod regs;
pub mod table;

#[cfg(test)]
mod testing;

pub use config::PicConfig;
pub use controller::{ChipHandles, Pic, PicState};
pub use dispatch::{DispatchOutcome, IrqStats, Route};
pub use error::{IoError, PicError, PicResult};
pub use gates::{EntryStub, IrqStubs, VectorGateInstaller};
pub use global::GlobalPic;
#[cfg(target_arch = "x86_64")]
pub use global::{helix_pic_dispatch, init_system, SYSTEM_PIC};
pub use io::{IoAddr, IoSpace, PortIo};
#[cfg(target_arch = "x86_64")]
pub use io::RawIo;
pub use line::{Chip, IrqLine, NUM_LINES};
pub use table::{IrqHandler, IrqTable, Registration};
