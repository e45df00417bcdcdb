//! # S1D13806 BitBLT Registers
//!
//! Offsets are bytes from the start of the mapped register window.
//!
//! ## Register Layout
//!
//! | Offset     | Width | Name            | Description                                   |
//! |------------|-------|-----------------|-----------------------------------------------|
//! | `$000000`  | 8     | REV_CODE        | Product code (bits 7-2) and revision          |
//! | `$000100`  | 8     | BLT_CTRL0       | Active bit, per-operand addressing mode       |
//! | `$000101`  | 8     | BLT_CTRL1       | Colour format (0 = 8 bpp, 1 = 16 bpp)         |
//! | `$000102`  | 8     | BLT_ROP         | 4-bit raster operation code                   |
//! | `$000103`  | 8     | BLT_OPERATION   | Operation select, see [`Operation`]           |
//! | `$000104`  | 16    | BLT_SRC_START01 | Source start address, bits 15-0               |
//! | `$000106`  | 8     | BLT_SRC_START2  | Source start address, bits 23-16              |
//! | `$000108`  | 16    | BLT_DST_START01 | Destination start address, bits 15-0          |
//! | `$00010A`  | 8     | BLT_DST_START2  | Destination start address, bits 23-16         |
//! | `$00010C`  | 16    | BLT_STRIDE      | Memory address offset, in pixels              |
//! | `$000110`  | 16    | BLT_WIDTH       | Width minus one                               |
//! | `$000112`  | 16    | BLT_HEIGHT      | Height minus one                              |
//! | `$000114`  | 16    | BLT_BG_COLOR    | Background colour                             |
//! | `$000118`  | 16    | BLT_FG_COLOR    | Foreground colour                             |
//! | `$100000`  | 8     | BITBLT_DATA     | Data port; reading it resets BitBLT data state|
//!
//! 16-bit registers are little-endian pairs of byte registers, so a word
//! write to `$000104` is the same as byte writes to `$000104` and `$000105`.

/// An 8-bit register, addressed by byte offset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reg8(pub usize);

/// A 16-bit register, addressed by byte offset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reg16(pub usize);

pub const REV_CODE: Reg8 = Reg8(0x000);

pub const BLT_CTRL0: Reg8 = Reg8(0x100);
pub const BLT_CTRL1: Reg8 = Reg8(0x101);
pub const BLT_ROP: Reg8 = Reg8(0x102);
pub const BLT_OPERATION: Reg8 = Reg8(0x103);
pub const BLT_SRC_START01: Reg16 = Reg16(0x104);
pub const BLT_SRC_START2: Reg8 = Reg8(0x106);
pub const BLT_DST_START01: Reg16 = Reg16(0x108);
pub const BLT_DST_START2: Reg8 = Reg8(0x10A);
pub const BLT_STRIDE: Reg16 = Reg16(0x10C);
pub const BLT_WIDTH: Reg16 = Reg16(0x110);
pub const BLT_HEIGHT: Reg16 = Reg16(0x112);
pub const BLT_BG_COLOR: Reg16 = Reg16(0x114);
pub const BLT_FG_COLOR: Reg16 = Reg16(0x118);

pub const BITBLT_DATA: Reg8 = Reg8(0x10_0000);

/// Size of the register window, including the BitBLT data aperture.
pub const REG_WINDOW_SIZE: usize = 0x20_0000;

/// Value of `REV_CODE >> 2` on an S1D13806.
pub const PRODUCT_CODE: u8 = 0x07;

/// Largest width or height `BLT_WIDTH`/`BLT_HEIGHT` can encode (stored minus one).
pub const MAX_EXTENT: u32 = 0x1_0000;
/// Largest line stride `BLT_STRIDE` holds, in pixels.
pub const MAX_STRIDE_PIXELS: u32 = 0xFFFF;
/// Display memory the 24-bit start address registers can reach.
pub const ADDRESS_SPACE: u32 = 1 << 24;

bitflags::bitflags! {
    /// BitBLT Control Register 0 at `$0100`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Ctrl0: u8 {
        /// Source uses rotated (SwivelView) addressing. Clear for linear.
        const SRC_ROTATED = 0b0000_0001;
        /// Destination uses rotated (SwivelView) addressing. Clear for linear.
        const DST_ROTATED = 0b0000_0010;
        /// Write to start an operation; reads back set while the engine is busy.
        const ACTIVE      = 0b1000_0000;
    }

    /// BitBLT Control Register 1 at `$0101`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Ctrl1: u8 {
        /// 16 bpp colour format. Clear for 8 bpp.
        const COLOR_16BPP = 0b0000_0001;
    }
}

/// BitBLT operation select at `$0103`.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    WriteRop = 0x0,
    Read = 0x1,
    MovePositiveRop = 0x2,
    MoveNegativeRop = 0x3,
    TransparentWrite = 0x4,
    TransparentMovePositive = 0x5,
    PatternFillRop = 0x6,
    PatternFillTransparent = 0x7,
    ColorExpand = 0x8,
    ColorExpandTransparent = 0x9,
    MoveColorExpand = 0xA,
    MoveColorExpandTransparent = 0xB,
    SolidFill = 0xC,
}

impl Operation {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits & 0x0F {
            0x0 => Self::WriteRop,
            0x1 => Self::Read,
            0x2 => Self::MovePositiveRop,
            0x3 => Self::MoveNegativeRop,
            0x4 => Self::TransparentWrite,
            0x5 => Self::TransparentMovePositive,
            0x6 => Self::PatternFillRop,
            0x7 => Self::PatternFillTransparent,
            0x8 => Self::ColorExpand,
            0x9 => Self::ColorExpandTransparent,
            0xA => Self::MoveColorExpand,
            0xB => Self::MoveColorExpandTransparent,
            0xC => Self::SolidFill,
            _ => return None,
        })
    }
}
