use bit_field::BitField;
use log::warn;
use s1d13806::regs::{
    BLT_BG_COLOR, BLT_CTRL0, BLT_CTRL1, BLT_DST_START01, BLT_DST_START2, BLT_FG_COLOR, BLT_HEIGHT,
    BLT_OPERATION, BLT_ROP, BLT_SRC_START01, BLT_SRC_START2, BLT_STRIDE, BLT_WIDTH, Ctrl0,
};

/// Latched BitBLT register values.
#[derive(Debug, Default, Clone)]
pub struct BlitterRegisters {
    pub ctrl0: u8,
    pub ctrl1: u8,
    pub rop: u8,
    pub operation: u8,
    pub src_start: u32,
    pub dst_start: u32,
    pub stride: u16,
    pub width: u16,
    pub height: u16,
    pub bg_color: u16,
    pub fg_color: u16,
}

/// Outcome of a register write the controller has to act on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteEffect {
    None,
    Start,
}

fn set_byte16(word: &mut u16, high: bool, data: u8) {
    let bits = if high { 8..16 } else { 0..8 };
    word.set_bits(bits, data as u16);
}

fn set_byte24(addr: &mut u32, byte: usize, data: u8) {
    addr.set_bits(byte * 8..byte * 8 + 8, data as u32);
}

fn byte24(addr: u32, byte: usize) -> u8 {
    addr.get_bits(byte * 8..byte * 8 + 8) as u8
}

fn byte16(word: u16, high: bool) -> u8 {
    if high { (word >> 8) as u8 } else { word as u8 }
}

impl BlitterRegisters {
    pub fn read_byte(&self, offset: usize) -> u8 {
        match offset {
            o if o == BLT_CTRL0.0 => self.ctrl0,
            o if o == BLT_CTRL1.0 => self.ctrl1,
            o if o == BLT_ROP.0 => self.rop,
            o if o == BLT_OPERATION.0 => self.operation,
            0x104..=0x106 => byte24(self.src_start, offset - BLT_SRC_START01.0),
            0x108..=0x10A => byte24(self.dst_start, offset - BLT_DST_START01.0),
            0x10C | 0x10D => byte16(self.stride, offset & 1 == 1),
            0x110 | 0x111 => byte16(self.width, offset & 1 == 1),
            0x112 | 0x113 => byte16(self.height, offset & 1 == 1),
            0x114 | 0x115 => byte16(self.bg_color, offset & 1 == 1),
            0x118 | 0x119 => byte16(self.fg_color, offset & 1 == 1),
            _ => {
                warn!("read from unmodelled register ${:06X}", offset);
                0
            }
        }
    }

    pub fn write_byte(&mut self, offset: usize, data: u8) -> WriteEffect {
        match offset {
            o if o == BLT_CTRL0.0 => {
                // ACTIVE is a command bit, the status side is tracked by the controller
                let ctrl = Ctrl0::from_bits_retain(data);
                self.ctrl0 = (ctrl - Ctrl0::ACTIVE).bits();
                if ctrl.contains(Ctrl0::ACTIVE) {
                    return WriteEffect::Start;
                }
            }
            o if o == BLT_CTRL1.0 => self.ctrl1 = data,
            o if o == BLT_ROP.0 => self.rop = data & 0x0F,
            o if o == BLT_OPERATION.0 => self.operation = data & 0x0F,
            0x104 | 0x105 => set_byte24(&mut self.src_start, offset - BLT_SRC_START01.0, data),
            o if o == BLT_SRC_START2.0 => set_byte24(&mut self.src_start, 2, data),
            0x108 | 0x109 => set_byte24(&mut self.dst_start, offset - BLT_DST_START01.0, data),
            o if o == BLT_DST_START2.0 => set_byte24(&mut self.dst_start, 2, data),
            0x10C | 0x10D => set_byte16(&mut self.stride, offset != BLT_STRIDE.0, data),
            0x110 | 0x111 => set_byte16(&mut self.width, offset != BLT_WIDTH.0, data),
            0x112 | 0x113 => set_byte16(&mut self.height, offset != BLT_HEIGHT.0, data),
            0x114 | 0x115 => set_byte16(&mut self.bg_color, offset != BLT_BG_COLOR.0, data),
            0x118 | 0x119 => set_byte16(&mut self.fg_color, offset != BLT_FG_COLOR.0, data),
            _ => warn!("write of {:#04x} to unmodelled register ${:06X}", data, offset),
        }
        WriteEffect::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_bytes_assemble() {
        let mut regs = BlitterRegisters::default();
        regs.write_byte(BLT_DST_START01.0, 0x34);
        regs.write_byte(BLT_DST_START01.0 + 1, 0x12);
        regs.write_byte(BLT_DST_START2.0, 0x05);
        assert_eq!(regs.dst_start, 0x05_1234);
        assert_eq!(regs.read_byte(BLT_DST_START2.0), 0x05);
    }

    #[test]
    fn active_bit_starts_and_is_not_latched() {
        let mut regs = BlitterRegisters::default();
        assert_eq!(regs.write_byte(BLT_CTRL0.0, 0x82), WriteEffect::Start);
        assert_eq!(regs.ctrl0, 0x02);
        assert_eq!(regs.write_byte(BLT_CTRL0.0, 0x00), WriteEffect::None);
    }

    #[test]
    fn word_registers_split_little_endian() {
        let mut regs = BlitterRegisters::default();
        regs.write_byte(BLT_WIDTH.0, 0x7F);
        regs.write_byte(BLT_WIDTH.0 + 1, 0x02);
        assert_eq!(regs.width, 0x027F);
        assert_eq!(regs.read_byte(BLT_WIDTH.0 + 1), 0x02);
    }
}
