use log::{debug, warn};
use s1d13806::{
    regs::{Ctrl0, Ctrl1, Operation},
    rop,
};

use crate::{registers::BlitterRegisters, vram::Vram};

/// One blit, latched from the registers when ACTIVE is written.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Blit {
    pub operation: Operation,
    pub rop: u8,
    pub bytes_per_pixel: usize,
    pub src: usize,
    pub dst: usize,
    pub stride: usize,
    pub width: usize,
    pub height: usize,
    pub fg_color: u16,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlitError {
    /// The operation code isn't one the model runs.
    Unsupported(u8),
    /// Rotated (SwivelView) addressing was selected.
    Rotated,
}

impl Blit {
    pub fn latch(regs: &BlitterRegisters) -> Result<Self, BlitError> {
        let ctrl0 = Ctrl0::from_bits_retain(regs.ctrl0);
        if ctrl0.intersects(Ctrl0::SRC_ROTATED | Ctrl0::DST_ROTATED) {
            return Err(BlitError::Rotated);
        }

        let operation = Operation::from_bits(regs.operation).ok_or(BlitError::Unsupported(regs.operation))?;
        let bytes_per_pixel = if Ctrl1::from_bits_retain(regs.ctrl1).contains(Ctrl1::COLOR_16BPP) {
            2
        } else {
            1
        };

        Ok(Self {
            operation,
            rop: regs.rop,
            bytes_per_pixel,
            src: regs.src_start as usize,
            dst: regs.dst_start as usize,
            stride: regs.stride as usize,
            width: regs.width as usize + 1,
            height: regs.height as usize + 1,
            fg_color: regs.fg_color,
        })
    }

    /// Byte offset of pixel (`col`, `row`) of the blit, counted from `start`.
    /// Negative moves count backwards from a bottom-right anchor.
    fn address(&self, start: usize, row: usize, col: usize, backwards: bool) -> Option<usize> {
        let step = (row * self.stride + col) * self.bytes_per_pixel;
        if backwards {
            start.checked_sub(step)
        } else {
            Some(start + step)
        }
    }

    fn pixel_mask(&self) -> u32 {
        if self.bytes_per_pixel == 2 { 0xFFFF } else { 0xFF }
    }

    /// Run the blit to completion. Returns the number of pixels written.
    pub fn run(&self, vram: &mut Vram) -> Result<u64, BlitError> {
        debug!(
            "blit {:?} rop {:#03x}: src {:#08x} dst {:#08x} {}x{} stride {}",
            self.operation, self.rop, self.src, self.dst, self.width, self.height, self.stride
        );

        let backwards = match self.operation {
            Operation::SolidFill | Operation::PatternFillRop | Operation::MovePositiveRop => false,
            Operation::MoveNegativeRop => true,
            other => return Err(BlitError::Unsupported(other as u8)),
        };

        let bpp = self.bytes_per_pixel;
        let mask = self.pixel_mask();
        let mut written = 0;
        let mut clipped = 0;

        for row in 0..self.height {
            for col in 0..self.width {
                let Some(dst) = self.address(self.dst, row, col, backwards) else {
                    clipped += 1;
                    continue;
                };

                let value = match self.operation {
                    Operation::SolidFill => self.fg_color as u32,
                    Operation::PatternFillRop => {
                        let Some(old) = vram.pixel(dst, bpp) else {
                            clipped += 1;
                            continue;
                        };
                        rop::apply(self.rop, self.fg_color as u32, old)
                    }
                    _ => {
                        let src = self
                            .address(self.src, row, col, backwards)
                            .and_then(|addr| vram.pixel(addr, bpp));
                        let (Some(src), Some(old)) = (src, vram.pixel(dst, bpp)) else {
                            clipped += 1;
                            continue;
                        };
                        rop::apply(self.rop, src, old)
                    }
                };

                if vram.set_pixel(dst, bpp, value & mask) {
                    written += 1;
                } else {
                    clipped += 1;
                }
            }
        }

        if clipped > 0 {
            warn!("blit touched {} pixels outside display memory", clipped);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs16() -> BlitterRegisters {
        BlitterRegisters {
            ctrl1: Ctrl1::COLOR_16BPP.bits(),
            stride: 8,
            ..Default::default()
        }
    }

    #[test]
    fn solid_fill_covers_rect() {
        let mut vram = Vram::new(8 * 8 * 2);
        let mut regs = regs16();
        regs.operation = Operation::SolidFill as u8;
        regs.dst_start = (8 + 1) * 2;
        regs.width = 2;
        regs.height = 1;
        regs.fg_color = 0xABCD;

        let blit = Blit::latch(&regs).unwrap();
        assert_eq!(blit.run(&mut vram).unwrap(), 6);
        assert_eq!(vram.pixel((8 + 1) * 2, 2), Some(0xABCD));
        assert_eq!(vram.pixel((16 + 3) * 2, 2), Some(0xABCD));
        assert_eq!(vram.pixel((16 + 4) * 2, 2), Some(0));
        assert_eq!(vram.pixel(0, 2), Some(0));
    }

    #[test]
    fn pattern_fill_applies_rop() {
        let mut vram = Vram::new(16);
        vram.set_pixel(0, 2, 0x0FF0);
        let mut regs = regs16();
        regs.operation = Operation::PatternFillRop as u8;
        regs.rop = 0x06; // xor
        regs.fg_color = 0x00FF;

        Blit::latch(&regs).unwrap().run(&mut vram).unwrap();
        assert_eq!(vram.pixel(0, 2), Some(0x0F0F));
    }

    #[test]
    fn negative_move_walks_backwards() {
        let mut vram = Vram::new(8);
        for (i, v) in [1u32, 2, 3, 4].iter().enumerate() {
            vram.set_pixel(i * 2, 2, *v);
        }
        // shift pixels 0..3 right by one, anchored at the last pixel
        let mut regs = regs16();
        regs.operation = Operation::MoveNegativeRop as u8;
        regs.rop = 0x0C;
        regs.src_start = 2 * 2;
        regs.dst_start = 3 * 2;
        regs.width = 2;

        Blit::latch(&regs).unwrap().run(&mut vram).unwrap();
        assert_eq!(vram.read_rect16(0, 8, 4, 1), [1, 1, 2, 3]);
    }

    #[test]
    fn rotated_and_unknown_are_refused() {
        let mut regs = regs16();
        regs.ctrl0 = Ctrl0::DST_ROTATED.bits();
        assert_eq!(Blit::latch(&regs), Err(BlitError::Rotated));

        let mut regs = regs16();
        regs.operation = Operation::ColorExpand as u8;
        let blit = Blit::latch(&regs).unwrap();
        assert_eq!(
            blit.run(&mut Vram::new(16)),
            Err(BlitError::Unsupported(Operation::ColorExpand as u8))
        );
    }
}
