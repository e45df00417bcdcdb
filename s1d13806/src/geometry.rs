//! Address and extent arithmetic for the BitBLT registers.
//!
//! The engine addresses video memory linearly in bytes. A blit is described
//! by a start address, a stride in pixels, and width/height registers that
//! hold the count minus one. Negative-direction blits start at the
//! bottom-right pixel and walk backwards.

use bit_field::BitField;

/// Pixel rectangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// From inclusive-exclusive corners, as the framework's Solid passes them.
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2.saturating_sub(x1),
            height: y2.saturating_sub(y1),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Raster order of a blit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Top-left to bottom-right.
    Positive,
    /// Bottom-right to top-left, for copies where the destination overlaps
    /// the source further along in memory.
    Negative,
}

impl Direction {
    /// From the framework's direction sign; negative iff `dir < 0`.
    pub fn from_sign(dir: i32) -> Self {
        if dir < 0 {
            Direction::Negative
        } else {
            Direction::Positive
        }
    }

    /// The direction that makes a same-surface copy from `src` to `dst` safe.
    pub fn for_copy(src: &Rect, dst: &Rect) -> Self {
        if src.intersects(dst) && (dst.y, dst.x) > (src.y, src.x) {
            Direction::Negative
        } else {
            Direction::Positive
        }
    }
}

/// Byte address of pixel (`x`, `y`).
#[inline(always)]
pub fn linear_address(base: u32, pitch: u32, bytes_per_pixel: u32, x: u32, y: u32) -> u32 {
    base + y * pitch + x * bytes_per_pixel
}

/// Byte address a blit of `rect` starts from.
///
/// Positive blits start at the top-left pixel, negative blits at the
/// bottom-right one.
#[inline(always)]
pub fn start_address(base: u32, pitch: u32, bytes_per_pixel: u32, rect: &Rect, dir: Direction) -> u32 {
    match dir {
        Direction::Positive => linear_address(base, pitch, bytes_per_pixel, rect.x, rect.y),
        Direction::Negative => linear_address(
            base,
            pitch,
            bytes_per_pixel,
            rect.x + rect.width - 1,
            rect.y + rect.height - 1,
        ),
    }
}

/// Width and height registers hold the count minus one.
///
/// `n` must be at least 1; empty blits are filtered out before this point.
#[inline(always)]
pub fn encode_extent(n: u32) -> u16 {
    debug_assert!(n >= 1, "empty extent reached the register encoder");
    (n - 1) as u16
}

/// Split an address into the low word and high byte registers.
#[inline(always)]
pub fn split_address(addr: u32) -> (u16, u8) {
    (addr.get_bits(0..16) as u16, addr.get_bits(16..24) as u8)
}

/// Stride register value for a pitch in bytes.
#[inline(always)]
pub fn stride_pixels(pitch: u32, bytes_per_pixel: u32) -> u16 {
    (pitch / bytes_per_pixel) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_address_is_top_left() {
        let rect = Rect::new(10, 20, 5, 5);
        assert_eq!(
            start_address(0x1000, 1600, 2, &rect, Direction::Positive),
            0x1000 + 20 * 1600 + 10 * 2
        );
    }

    #[test]
    fn negative_address_is_bottom_right() {
        let rect = Rect::new(10, 10, 5, 5);
        assert_eq!(
            start_address(0, 1600, 2, &rect, Direction::Negative),
            14 * 1600 + 14 * 2
        );
        let rect = Rect::new(0, 0, 1, 1);
        assert_eq!(start_address(64, 1600, 2, &rect, Direction::Negative), 64);
    }

    #[test]
    fn extents_are_count_minus_one() {
        assert_eq!(encode_extent(1), 0);
        assert_eq!(encode_extent(800), 799);
        assert_eq!(encode_extent(600), 599);
    }

    #[test]
    fn addresses_split_into_word_and_byte() {
        assert_eq!(split_address(0x0012_3456), (0x3456, 0x12));
        assert_eq!(split_address(0x0000_FFFF), (0xFFFF, 0x00));
        assert_eq!(split_address(0x0013_8800), (0x8800, 0x13));
    }

    #[test]
    fn stride_is_in_pixels() {
        assert_eq!(stride_pixels(1600, 2), 800);
        assert_eq!(stride_pixels(640, 1), 640);
    }

    #[test]
    fn corners_and_emptiness() {
        assert_eq!(Rect::from_corners(2, 3, 10, 3), Rect::new(2, 3, 8, 0));
        assert!(Rect::from_corners(2, 3, 10, 3).is_empty());
        assert!(Rect::new(0, 0, 0, 9).is_empty());
    }

    #[test]
    fn copy_direction_follows_overlap() {
        let src = Rect::new(10, 10, 20, 20);
        assert_eq!(Direction::for_copy(&src, &Rect::new(15, 15, 20, 20)), Direction::Negative);
        assert_eq!(Direction::for_copy(&src, &Rect::new(5, 5, 20, 20)), Direction::Positive);
        assert_eq!(Direction::for_copy(&src, &Rect::new(12, 10, 20, 20)), Direction::Negative);
        assert_eq!(Direction::for_copy(&src, &Rect::new(100, 100, 20, 20)), Direction::Positive);
        assert_eq!(Direction::from_sign(-1), Direction::Negative);
        assert_eq!(Direction::from_sign(1), Direction::Positive);
    }
}
