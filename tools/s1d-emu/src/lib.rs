//! # S1D13806 Model
//!
//! A register-level model of the S1D13806 BitBLT engine and its display
//! memory. [`Controller`] implements [`RegisterIo`], so the driver runs
//! against it unchanged.
//!
//! Blits execute in full the moment ACTIVE is written. The status bit then
//! reads back set for [`EmuConfig::latency`] polls, which exercises the
//! driver's completion wait the way real hardware would.
//!
//! Supported operations are solid fill, pattern fill with ROP (the pattern
//! is the foreground colour) and both directions of move with ROP. Anything
//! else is logged and skipped.

#![no_std]
extern crate alloc;

pub mod blitter;
pub mod registers;
pub mod trace;
pub mod vram;

use alloc::vec::Vec;
use log::{debug, warn};
use s1d13806::{
    RegisterIo,
    regs::{BITBLT_DATA, BLT_CTRL0, Ctrl0, REV_CODE, Reg8, Reg16},
};

use crate::{
    blitter::Blit,
    registers::{BlitterRegisters, WriteEffect},
    trace::{Access, Stats},
    vram::Vram,
};

/// Static properties of the modelled board.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EmuConfig {
    /// Bytes of display memory.
    pub vram_size: usize,
    /// Value returned from `REV_CODE`.
    pub rev_code: u8,
    /// Status polls a blit stays busy for after it's started.
    pub latency: u32,
}

impl Default for EmuConfig {
    fn default() -> Self {
        Self {
            vram_size: 0x14_0000,
            rev_code: 0x1C,
            latency: 4,
        }
    }
}

#[derive(Debug)]
pub struct Controller {
    config: EmuConfig,
    regs: BlitterRegisters,
    vram: Vram,
    busy_polls: u32,
    stats: Stats,
    trace: Option<Vec<Access>>,
}

impl Controller {
    pub fn new(config: EmuConfig) -> Self {
        debug!(
            "controller: {:#x} bytes vram, rev {:#04x}, latency {}",
            config.vram_size, config.rev_code, config.latency
        );
        Self {
            config,
            regs: BlitterRegisters::default(),
            vram: Vram::new(config.vram_size),
            busy_polls: 0,
            stats: Stats::default(),
            trace: None,
        }
    }

    pub fn config(&self) -> &EmuConfig {
        &self.config
    }

    pub fn registers(&self) -> &BlitterRegisters {
        &self.regs
    }

    pub fn vram(&self) -> &Vram {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut Vram {
        &mut self.vram
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn is_busy(&self) -> bool {
        self.busy_polls > 0
    }

    /// Start recording every bus access.
    pub fn enable_trace(&mut self) {
        self.trace.get_or_insert_with(Vec::new);
    }

    /// Hand back the accesses recorded so far and keep recording.
    pub fn take_trace(&mut self) -> Vec<Access> {
        self.trace.as_mut().map(core::mem::take).unwrap_or_default()
    }

    fn record(&mut self, access: Access) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(access);
        }
    }

    fn start(&mut self) {
        if self.busy_polls > 0 {
            warn!("blit started while the previous one is still active");
        }

        let result = Blit::latch(&self.regs).and_then(|blit| blit.run(&mut self.vram));
        match result {
            Ok(pixels) => {
                self.stats.blits += 1;
                self.stats.pixels += pixels;
            }
            Err(e) => {
                warn!("blit not run: {:?}", e);
                self.stats.refused += 1;
            }
        }
        self.busy_polls = self.config.latency;
    }

    fn read_status(&mut self) -> u8 {
        self.stats.status_polls += 1;
        let mut ctrl = Ctrl0::from_bits_retain(self.regs.ctrl0);
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            ctrl |= Ctrl0::ACTIVE;
        }
        ctrl.bits()
    }

    fn read_raw(&mut self, offset: usize) -> u8 {
        match offset {
            o if o == REV_CODE.0 => self.config.rev_code,
            o if o == BLT_CTRL0.0 => self.read_status(),
            o if o == BITBLT_DATA.0 => {
                self.stats.drains += 1;
                0
            }
            _ => self.regs.read_byte(offset),
        }
    }

    fn write_raw(&mut self, offset: usize, value: u8) {
        match offset {
            o if o == REV_CODE.0 => warn!("write of {:#04x} to read-only REV_CODE", value),
            o if o == BITBLT_DATA.0 => warn!("host data write of {:#04x} ignored", value),
            _ => {
                if self.regs.write_byte(offset, value) == WriteEffect::Start {
                    self.start();
                }
            }
        }
    }
}

impl RegisterIo for Controller {
    fn read8(&mut self, reg: Reg8) -> u8 {
        let value = self.read_raw(reg.0);
        self.record(Access::Read8 { offset: reg.0, value });
        value
    }

    fn write8(&mut self, reg: Reg8, value: u8) {
        self.record(Access::Write8 { offset: reg.0, value });
        self.write_raw(reg.0, value);
    }

    fn read16(&mut self, reg: Reg16) -> u16 {
        let lo = self.read_raw(reg.0);
        let hi = self.read_raw(reg.0 + 1);
        let value = u16::from_le_bytes([lo, hi]);
        self.record(Access::Read16 { offset: reg.0, value });
        value
    }

    fn write16(&mut self, reg: Reg16, value: u16) {
        self.record(Access::Write16 { offset: reg.0, value });
        let [lo, hi] = value.to_le_bytes();
        self.write_raw(reg.0, lo);
        self.write_raw(reg.0 + 1, hi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s1d13806::regs::{BLT_CTRL1, BLT_FG_COLOR, BLT_HEIGHT, BLT_OPERATION, BLT_STRIDE, BLT_WIDTH, Operation};

    #[test]
    fn rev_code_reads_configured_value() {
        let mut ctl = Controller::new(EmuConfig {
            rev_code: 0x1D,
            ..Default::default()
        });
        assert_eq!(ctl.read8(REV_CODE), 0x1D);
    }

    #[test]
    fn active_reads_back_for_latency_polls() {
        let mut ctl = Controller::new(EmuConfig {
            vram_size: 64,
            latency: 2,
            ..Default::default()
        });
        ctl.write8(BLT_OPERATION, Operation::SolidFill as u8);
        ctl.write8(BLT_CTRL0, Ctrl0::ACTIVE.bits());

        assert!(ctl.is_busy());
        assert_eq!(ctl.read8(BLT_CTRL0) & 0x80, 0x80);
        assert_eq!(ctl.read8(BLT_CTRL0) & 0x80, 0x80);
        assert_eq!(ctl.read8(BLT_CTRL0) & 0x80, 0);
        assert_eq!(ctl.stats().status_polls, 3);
        assert_eq!(ctl.stats().blits, 1);
    }

    #[test]
    fn word_write_runs_fill() {
        let mut ctl = Controller::new(EmuConfig {
            vram_size: 64,
            ..Default::default()
        });
        ctl.write8(BLT_CTRL1, 1);
        ctl.write16(BLT_STRIDE, 4);
        ctl.write16(BLT_WIDTH, 3);
        ctl.write16(BLT_HEIGHT, 1);
        ctl.write16(BLT_FG_COLOR, 0x1234);
        ctl.write8(BLT_OPERATION, Operation::SolidFill as u8);
        ctl.write8(BLT_CTRL0, 0x80);

        assert_eq!(ctl.read16(BLT_FG_COLOR), 0x1234);
        assert!(ctl.vram().words()[..8].iter().all(|w| *w == 0x1234));
        assert_eq!(ctl.vram().words()[8], 0);
        assert_eq!(ctl.stats().pixels, 8);
    }

    #[test]
    fn trace_records_in_order() {
        let mut ctl = Controller::new(EmuConfig::default());
        ctl.enable_trace();
        ctl.write16(BLT_WIDTH, 7);
        ctl.read8(BITBLT_DATA);

        let trace = ctl.take_trace();
        assert_eq!(
            trace,
            [
                Access::Write16 { offset: BLT_WIDTH.0, value: 7 },
                Access::Read8 { offset: BITBLT_DATA.0, value: 0 },
            ]
        );
        assert_eq!(ctl.stats().drains, 1);
        assert!(ctl.take_trace().is_empty());
    }
}
