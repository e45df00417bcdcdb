//! Register bus that records every access, for unit tests.

use std::collections::HashMap;
use std::vec::Vec;

use crate::{
    mmio::RegisterIo,
    regs::{BLT_CTRL0, PRODUCT_CODE, REV_CODE, Reg8, Reg16},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Read8(Reg8, u8),
    Write8(Reg8, u8),
    Read16(Reg16, u16),
    Write16(Reg16, u16),
}

impl Access {
    pub fn is_write(&self) -> bool {
        matches!(self, Access::Write8(..) | Access::Write16(..))
    }
}

/// Sparse register file. Starting a blit keeps `ACTIVE` set for
/// `busy_polls` status reads.
pub struct RecordingBus {
    bytes: HashMap<usize, u8>,
    pub log: Vec<Access>,
    pub busy_polls: u32,
    busy_left: u32,
}

impl RecordingBus {
    pub fn new() -> Self {
        let mut bus = Self {
            bytes: HashMap::new(),
            log: Vec::new(),
            busy_polls: 0,
            busy_left: 0,
        };
        bus.bytes.insert(REV_CODE.0, PRODUCT_CODE << 2);
        bus
    }

    /// Store without logging. Setting `ACTIVE` arms the busy countdown.
    pub fn set8(&mut self, reg: Reg8, value: u8) {
        self.bytes.insert(reg.0, value);
        if reg == BLT_CTRL0 && value & 0x80 != 0 {
            self.busy_left = self.busy_polls;
        }
    }

    pub fn get8(&self, reg: Reg8) -> u8 {
        self.bytes.get(&reg.0).copied().unwrap_or(0)
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        let lo = self.bytes.get(&reg.0).copied().unwrap_or(0);
        let hi = self.bytes.get(&(reg.0 + 1)).copied().unwrap_or(0);
        u16::from_le_bytes([lo, hi])
    }

    pub fn writes(&self) -> Vec<Access> {
        self.log.iter().copied().filter(Access::is_write).collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl RegisterIo for RecordingBus {
    fn read8(&mut self, reg: Reg8) -> u8 {
        let mut value = self.get8(reg);
        if reg == BLT_CTRL0 && value & 0x80 != 0 {
            if self.busy_left > 0 {
                self.busy_left -= 1;
            } else {
                value &= !0x80;
                self.bytes.insert(reg.0, value);
            }
        }
        self.log.push(Access::Read8(reg, value));
        value
    }

    fn write8(&mut self, reg: Reg8, value: u8) {
        self.log.push(Access::Write8(reg, value));
        self.set8(reg, value);
    }

    fn read16(&mut self, reg: Reg16) -> u16 {
        let value = self.get16(reg);
        self.log.push(Access::Read16(reg, value));
        value
    }

    fn write16(&mut self, reg: Reg16, value: u16) {
        self.log.push(Access::Write16(reg, value));
        let [lo, hi] = value.to_le_bytes();
        self.bytes.insert(reg.0, lo);
        self.bytes.insert(reg.0 + 1, hi);
    }
}
