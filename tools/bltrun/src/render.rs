use std::path::Path;

use anyhow::{Context, Result};
use image::{GrayImage, RgbImage};
use s1d13806::DisplayMode;
use s1d_emu::vram::Vram;

/// Expand an RGB565 pixel to 8 bits per channel.
pub fn rgb565(px: u16) -> [u8; 3] {
    let r = ((px >> 11) & 0x1F) as u8;
    let g = ((px >> 5) & 0x3F) as u8;
    let b = (px & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// Write the visible screen to `path`. 16 bpp is read as RGB565, 8 bpp as
/// greyscale.
pub fn save_screen(vram: &Vram, mode: &DisplayMode, path: &Path) -> Result<()> {
    let stride = mode.byte_stride as usize;
    let bpp = mode.bytes_per_pixel() as usize;
    let pixel = |x: u32, y: u32| vram.pixel(y as usize * stride + x as usize * bpp, bpp).unwrap_or(0);

    let result = if bpp == 2 {
        RgbImage::from_fn(mode.width, mode.height, |x, y| image::Rgb(rgb565(pixel(x, y) as u16))).save(path)
    } else {
        GrayImage::from_fn(mode.width, mode.height, |x, y| image::Luma([pixel(x, y) as u8])).save(path)
    };

    result.with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb565_extremes() {
        assert_eq!(rgb565(0x0000), [0, 0, 0]);
        assert_eq!(rgb565(0xFFFF), [255, 255, 255]);
        assert_eq!(rgb565(0xF800), [255, 0, 0]);
        assert_eq!(rgb565(0x07E0), [0, 255, 0]);
        assert_eq!(rgb565(0x001F), [0, 0, 255]);
    }
}
