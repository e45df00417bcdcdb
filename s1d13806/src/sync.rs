//! Completion and sync markers.
//!
//! The engine runs one blit at a time and has no completion interrupt wired
//! up, so completion is detected by polling `BLT_CTRL0.ACTIVE`. The poll sits
//! behind [`IdleWait`] so an interrupt-driven wait can replace it without
//! touching the engine.
//!
//! There is no timeout. A wedged controller spins here forever.

use bit_field::BitField;

use crate::{
    mmio::RegisterIo,
    regs::{BITBLT_DATA, BLT_CTRL0},
};

/// Bit 7 of `BLT_CTRL0`.
const ACTIVE_BIT: usize = 7;

/// Blocks until the BitBLT engine is idle.
pub trait IdleWait {
    fn wait_idle<R: RegisterIo + ?Sized>(&mut self, regs: &mut R);
}

/// Tight spin on the active bit.
#[derive(Copy, Clone, Debug, Default)]
pub struct BusyWait;

impl IdleWait for BusyWait {
    #[inline(always)]
    fn wait_idle<R: RegisterIo + ?Sized>(&mut self, regs: &mut R) {
        while is_active(regs) {
            core::hint::spin_loop();
        }
    }
}

/// One status read.
#[inline(always)]
pub fn is_active<R: RegisterIo + ?Sized>(regs: &mut R) -> bool {
    regs.read8(BLT_CTRL0).get_bit(ACTIVE_BIT)
}

/// Read the BitBLT data port once, which resets the engine's data state.
#[inline(always)]
pub fn drain<R: RegisterIo + ?Sized>(regs: &mut R) {
    let _ = regs.read8(BITBLT_DATA);
}

/// Token identifying a point in the command stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Marker(pub u32);

/// The framework's sync facility, called when work has been queued.
pub trait SyncMarker {
    fn mark_sync(&mut self) -> Marker;
}

/// Hands out increasing markers. For frameworks that have no marker
/// bookkeeping of their own.
#[derive(Clone, Debug, Default)]
pub struct SequentialMarkers {
    last: u32,
}

impl SequentialMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent marker handed out, if any.
    pub fn last(&self) -> Option<Marker> {
        (self.last != 0).then_some(Marker(self.last))
    }
}

impl SyncMarker for SequentialMarkers {
    fn mark_sync(&mut self) -> Marker {
        self.last = self.last.wrapping_add(1);
        Marker(self.last)
    }
}

impl<S: SyncMarker + ?Sized> SyncMarker for &mut S {
    fn mark_sync(&mut self) -> Marker {
        (**self).mark_sync()
    }
}
