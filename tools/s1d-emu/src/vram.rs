use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};

/// Display memory, byte addressed.
///
/// Stored as 16-bit words so 16 bpp pixels can be read without copying.
/// Words are in host byte order; the controller is little-endian, as are the
/// hosts this runs on.
pub struct Vram {
    words: Box<[u16]>,
}

impl Vram {
    pub fn new(size: usize) -> Self {
        Self {
            words: vec![0u16; size.div_ceil(2)].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Read a 1 or 2 byte pixel. `None` past the end of memory.
    pub fn pixel(&self, addr: usize, bytes_per_pixel: usize) -> Option<u32> {
        let bytes = self.bytes();
        match bytes_per_pixel {
            1 => bytes.get(addr).map(|b| *b as u32),
            _ => {
                let b = bytes.get(addr..addr + 2)?;
                Some(u16::from_ne_bytes([b[0], b[1]]) as u32)
            }
        }
    }

    /// Write a 1 or 2 byte pixel. Returns false past the end of memory.
    pub fn set_pixel(&mut self, addr: usize, bytes_per_pixel: usize, value: u32) -> bool {
        let bytes = self.bytes_mut();
        match bytes_per_pixel {
            1 => match bytes.get_mut(addr) {
                Some(b) => {
                    *b = value as u8;
                    true
                }
                None => false,
            },
            _ => match bytes.get_mut(addr..addr + 2) {
                Some(b) => {
                    b.copy_from_slice(&(value as u16).to_ne_bytes());
                    true
                }
                None => false,
            },
        }
    }

    /// Copy out a `width` x `height` block of 16 bpp pixels starting at byte
    /// `offset`, `pitch` bytes per row.
    pub fn read_rect16(&self, offset: usize, pitch: usize, width: usize, height: usize) -> Vec<u16> {
        let mut out = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let px = self.pixel(offset + y * pitch + x * 2, 2).unwrap_or(0);
                out.push(px as u16);
            }
        }
        out
    }
}

impl Debug for Vram {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Vram").field("len", &self.len()).finish()
    }
}
