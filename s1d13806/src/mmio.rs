//! Register access.
//!
//! Every other module talks to the controller through [`RegisterIo`]. The
//! hardware implementation is [`Mmio`]; the emulator in `s1d-emu` and the
//! unit-test bus implement the same trait.

use core::ptr::NonNull;

use volatile_register::RW;

use crate::{
    error::InitError,
    regs::{BITBLT_DATA, Reg8, Reg16},
};

/// Byte and word access to the controller's register window.
///
/// Accesses are never cached or reordered: each call is one bus cycle with
/// whatever side effect the register has. Reads take `&mut self` because
/// some registers change state when read.
pub trait RegisterIo {
    fn read8(&mut self, reg: Reg8) -> u8;
    fn write8(&mut self, reg: Reg8, value: u8);
    fn read16(&mut self, reg: Reg16) -> u16;
    fn write16(&mut self, reg: Reg16, value: u16);
}

impl<T: RegisterIo + ?Sized> RegisterIo for &mut T {
    #[inline(always)]
    fn read8(&mut self, reg: Reg8) -> u8 {
        (**self).read8(reg)
    }

    #[inline(always)]
    fn write8(&mut self, reg: Reg8, value: u8) {
        (**self).write8(reg, value)
    }

    #[inline(always)]
    fn read16(&mut self, reg: Reg16) -> u16 {
        (**self).read16(reg)
    }

    #[inline(always)]
    fn write16(&mut self, reg: Reg16, value: u16) {
        (**self).write16(reg, value)
    }
}

/// The register window mapped into the CPU's address space.
///
/// Not `Send` or `Sync`: the controller has a single BitBLT engine and no
/// locking happens here. Wrap it in a mutex if several threads need it.
pub struct Mmio {
    base: NonNull<u8>,
    len: usize,
}

impl Mmio {
    /// Wrap an already-mapped register window.
    ///
    /// Fails if `base` is null, not 16-bit aligned, or if `len` does not
    /// reach the BitBLT data port.
    ///
    /// # Safety
    ///
    /// `base` must point to the controller's register window, mapped for
    /// `len` bytes with device (uncached) memory attributes, for as long as
    /// the returned value lives.
    pub unsafe fn new(base: *mut u8, len: usize) -> Result<Self, InitError> {
        let base = NonNull::new(base).ok_or(InitError::Unmapped)?;
        if base.as_ptr() as usize % 2 != 0 {
            return Err(InitError::MisalignedWindow(base.as_ptr() as usize));
        }
        if len <= BITBLT_DATA.0 {
            return Err(InitError::WindowTooSmall(len));
        }
        Ok(Self { base, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    fn byte(&self, reg: Reg8) -> &RW<u8> {
        debug_assert!(reg.0 < self.len);
        // SAFETY: the window was validated in `new`, and RW<u8> is a
        // transparent volatile cell.
        unsafe { &*(self.base.as_ptr().add(reg.0) as *const RW<u8>) }
    }

    #[inline(always)]
    fn word(&self, reg: Reg16) -> &RW<u16> {
        debug_assert!(reg.0 + 1 < self.len && reg.0 % 2 == 0);
        // SAFETY: as above; word registers sit on even offsets and the base
        // is 16-bit aligned.
        unsafe { &*(self.base.as_ptr().add(reg.0) as *const RW<u16>) }
    }
}

impl RegisterIo for Mmio {
    #[inline(always)]
    fn read8(&mut self, reg: Reg8) -> u8 {
        self.byte(reg).read()
    }

    #[inline(always)]
    fn write8(&mut self, reg: Reg8, value: u8) {
        unsafe { self.byte(reg).write(value) }
    }

    #[inline(always)]
    fn read16(&mut self, reg: Reg16) -> u16 {
        self.word(reg).read()
    }

    #[inline(always)]
    fn write16(&mut self, reg: Reg16, value: u16) {
        unsafe { self.word(reg).write(value) }
    }
}
