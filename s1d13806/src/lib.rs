//! # S1D13806 BitBLT Driver
//!
//! Hardware acceleration of solid fills and screen-to-screen copies on the
//! Epson S1D13806 display controller, for a 2D acceleration framework that
//! falls back to software for anything the engine declines.
//!
//! ## Layers
//!
//! | Module      | What it does                                              |
//! |-------------|-----------------------------------------------------------|
//! | [`regs`]    | Register offsets and bit definitions                      |
//! | [`mmio`]    | [`RegisterIo`] and the memory-mapped implementation       |
//! | [`rop`]     | Logical raster operations to hardware ROP codes           |
//! | [`geometry`]| Start addresses, extents and strides                      |
//! | [`sync`]    | Completion polling and sync markers                       |
//! | [`engine`]  | The device context and its prepare/execute/done cycle     |
//! | [`session`] | Borrowing sessions that enforce the cycle                 |
//! | [`accel`]   | Framework hooks and the capability table                  |
//!
//! ## Bringing It Up
//!
//! ```ignore
//! let regs = unsafe { Mmio::new(mapped_registers, REG_WINDOW_SIZE)? };
//! let mode = DisplayMode::packed(800, 600, 16);
//! let region = FramebufferRegion::for_mode(vram_base, vram_size, &mode);
//!
//! let mut engine = BltEngine::init(regs, BusyWait, SequentialMarkers::new(), mode, region)?;
//! engine.register(&mut framework)?;
//! engine.enable();
//! ```
//!
//! ## Threads
//!
//! There is one BitBLT engine and no locking. [`Mmio`] is neither `Send`
//! nor `Sync`; callers that share an engine across threads must put it
//! behind their own mutex.

#![cfg_attr(not(test), no_std)]

pub mod accel;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod mmio;
pub mod regs;
pub mod rop;
pub mod session;
pub mod surface;
pub mod sync;

#[cfg(test)]
mod testing;

pub use accel::{AccelFlags, AccelOps, AccelRegistry, Capabilities};
pub use engine::{BltEngine, CopyContext, Phase, SurfaceRef};
pub use error::{Declined, InitError};
pub use geometry::{Direction, Rect};
pub use mmio::{Mmio, RegisterIo};
pub use rop::Rop;
pub use session::{ExecutedCopy, ExecutedSolid, PreparedCopy, PreparedSolid};
pub use surface::{DisplayMode, FramebufferRegion, Pixmap, PlaneMask, Surface};
pub use sync::{BusyWait, IdleWait, Marker, SequentialMarkers, SyncMarker};
