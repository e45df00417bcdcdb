//! Surfaces, display modes and the framebuffer region, as seen by the driver.
//!
//! Surfaces belong to the acceleration framework. The driver only reads their
//! geometry; pixels change through the BitBLT engine.

use crate::{
    error::InitError,
    regs::{ADDRESS_SPACE, MAX_EXTENT, MAX_STRIDE_PIXELS},
};

/// Geometry of a framework-owned pixel buffer in video memory.
pub trait Pixmap {
    /// Byte offset of pixel (0, 0) from the start of video memory.
    fn offset(&self) -> u32;
    /// Bytes per row.
    fn pitch(&self) -> u32;
    fn bits_per_pixel(&self) -> u8;
    /// Significant bits per pixel, used to judge plane masks.
    fn depth(&self) -> u8 {
        self.bits_per_pixel()
    }
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

impl<P: Pixmap + ?Sized> Pixmap for &P {
    fn offset(&self) -> u32 {
        (**self).offset()
    }
    fn pitch(&self) -> u32 {
        (**self).pitch()
    }
    fn bits_per_pixel(&self) -> u8 {
        (**self).bits_per_pixel()
    }
    fn depth(&self) -> u8 {
        (**self).depth()
    }
    fn width(&self) -> u32 {
        (**self).width()
    }
    fn height(&self) -> u32 {
        (**self).height()
    }
}

/// Plain-data [`Pixmap`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    pub offset: u32,
    pub pitch: u32,
    pub bits_per_pixel: u8,
    pub depth: u8,
    pub width: u32,
    pub height: u32,
}

impl Surface {
    /// A surface whose depth equals its bits per pixel.
    pub const fn new(offset: u32, pitch: u32, bits_per_pixel: u8, width: u32, height: u32) -> Self {
        Self {
            offset,
            pitch,
            bits_per_pixel,
            depth: bits_per_pixel,
            width,
            height,
        }
    }

    /// The visible screen of `mode`, at the start of video memory.
    pub const fn screen(mode: &DisplayMode) -> Self {
        Self::new(0, mode.byte_stride, mode.bits_per_pixel, mode.width, mode.height)
    }
}

impl Pixmap for Surface {
    fn offset(&self) -> u32 {
        self.offset
    }
    fn pitch(&self) -> u32 {
        self.pitch
    }
    fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }
    fn depth(&self) -> u8 {
        self.depth
    }
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
}

/// Per-operation colour plane write enable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlaneMask(pub u32);

impl PlaneMask {
    pub const SOLID: PlaneMask = PlaneMask(!0);

    /// True when every plane of a `depth`-bit pixel is enabled.
    pub fn is_solid(self, depth: u8) -> bool {
        let full = if depth >= 32 { !0 } else { (1u32 << depth) - 1 };
        self.0 & full == full
    }
}

/// The active display mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u8,
    /// Bytes per scanline of the visible screen.
    pub byte_stride: u32,
}

impl DisplayMode {
    /// A mode with no padding at the end of each line. A stride too large
    /// for a `u32` saturates, and such a mode fails validation.
    pub const fn packed(width: u32, height: u32, bits_per_pixel: u8) -> Self {
        Self {
            width,
            height,
            bits_per_pixel,
            byte_stride: width.saturating_mul(bits_per_pixel as u32 / 8),
        }
    }

    pub const fn bytes_per_pixel(&self) -> u32 {
        self.bits_per_pixel as u32 / 8
    }

    /// Bytes taken by the visible screen, saturating at `u32::MAX`.
    pub const fn screen_bytes(&self) -> u32 {
        self.byte_stride.saturating_mul(self.height)
    }

    pub(crate) fn validate(&self) -> Result<(), InitError> {
        if !matches!(self.bits_per_pixel, 8 | 16) {
            return Err(InitError::UnsupportedDepth(self.bits_per_pixel));
        }
        if self.width == 0 || self.height == 0 {
            return Err(InitError::BadGeometry("empty display mode"));
        }
        if self.width > MAX_EXTENT || self.height > MAX_EXTENT {
            return Err(InitError::BadGeometry("mode is larger than a blit can cover"));
        }
        let bpp = self.bytes_per_pixel();
        let scanline = self
            .width
            .checked_mul(bpp)
            .ok_or(InitError::BadGeometry("scanline overflows"))?;
        if self.byte_stride < scanline {
            return Err(InitError::BadGeometry("stride shorter than a scanline"));
        }
        if self.byte_stride % bpp != 0 {
            return Err(InitError::BadGeometry("stride is not a whole number of pixels"));
        }
        if self.byte_stride / bpp > MAX_STRIDE_PIXELS {
            return Err(InitError::BadGeometry("stride does not fit the stride register"));
        }
        self.byte_stride
            .checked_mul(self.height)
            .filter(|&bytes| bytes <= ADDRESS_SPACE)
            .ok_or(InitError::BadGeometry("screen is larger than addressable memory"))?;
        Ok(())
    }
}

/// Video memory as handed to the framework's offscreen allocator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FramebufferRegion {
    /// CPU address of video memory.
    pub base: usize,
    /// Total bytes of video memory.
    pub size: u32,
    /// First byte available for offscreen pixmaps.
    pub offscreen_base: u32,
}

impl FramebufferRegion {
    /// Offscreen memory starts right after the visible screen. For a mode
    /// whose screen overflows a `u32` the base saturates and validation
    /// rejects the region.
    pub const fn for_mode(base: usize, size: u32, mode: &DisplayMode) -> Self {
        Self {
            base,
            size,
            offscreen_base: mode.screen_bytes(),
        }
    }

    pub(crate) fn validate(&self, mode: &DisplayMode) -> Result<(), InitError> {
        if self.size > ADDRESS_SPACE {
            return Err(InitError::BadGeometry("video memory is larger than the address registers reach"));
        }
        if self.offscreen_base < mode.screen_bytes() {
            return Err(InitError::BadGeometry("offscreen memory overlaps the screen"));
        }
        if self.offscreen_base > self.size {
            return Err(InitError::BadGeometry("offscreen base is past the end of video memory"));
        }
        Ok(())
    }
}
