//! # Raster Operations
//!
//! The framework speaks the 16 X11 `GX*` logical functions. The BitBLT
//! engine takes a 4-bit truth table instead: output bit for source bit `s`
//! and destination bit `d` is bit `(s << 1) | d` of the code.
//!
//! | Logical        | Result            | Code   |
//! |----------------|-------------------|--------|
//! | `Clear`        | 0                 | `0x00` |
//! | `And`          | src AND dst       | `0x08` |
//! | `AndReverse`   | src AND NOT dst   | `0x04` |
//! | `Copy`         | src               | `0x0C` |
//! | `AndInverted`  | NOT src AND dst   | `0x02` |
//! | `Noop`         | dst               | `0x0A` |
//! | `Xor`          | src XOR dst       | `0x06` |
//! | `Or`           | src OR dst        | `0x0E` |
//! | `Nor`          | NOT src AND NOT dst | `0x01` |
//! | `Equiv`        | NOT src XOR dst   | `0x09` |
//! | `Invert`       | NOT dst           | `0x05` |
//! | `OrReverse`    | src OR NOT dst    | `0x0D` |
//! | `CopyInverted` | NOT src           | `0x03` |
//! | `OrInverted`   | NOT src OR dst    | `0x0B` |
//! | `Nand`         | NOT src OR NOT dst| `0x07` |
//! | `Set`          | 1                 | `0x0F` |

/// Hardware ROP codes, indexed by logical function.
const HW_ROP: [u8; 16] = [
    0x00, 0x08, 0x04, 0x0C, 0x02, 0x0A, 0x06, 0x0E, 0x01, 0x09, 0x05, 0x0D, 0x03, 0x0B, 0x07, 0x0F,
];

/// A logical raster operation, numbered like X11's `GXclear..GXset`.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rop {
    Clear = 0x0,
    And = 0x1,
    AndReverse = 0x2,
    Copy = 0x3,
    AndInverted = 0x4,
    Noop = 0x5,
    Xor = 0x6,
    Or = 0x7,
    Nor = 0x8,
    Equiv = 0x9,
    Invert = 0xA,
    OrReverse = 0xB,
    CopyInverted = 0xC,
    OrInverted = 0xD,
    Nand = 0xE,
    Set = 0xF,
}

impl Rop {
    pub const ALL: [Rop; 16] = [
        Rop::Clear,
        Rop::And,
        Rop::AndReverse,
        Rop::Copy,
        Rop::AndInverted,
        Rop::Noop,
        Rop::Xor,
        Rop::Or,
        Rop::Nor,
        Rop::Equiv,
        Rop::Invert,
        Rop::OrReverse,
        Rop::CopyInverted,
        Rop::OrInverted,
        Rop::Nand,
        Rop::Set,
    ];

    /// Convert a framework ALU code.
    ///
    /// # Panics
    ///
    /// If `alu > 15`. The framework only ever passes the 16 standard codes.
    pub fn from_alu(alu: u8) -> Rop {
        assert!(alu < 16, "raster operation {alu} out of range");
        Self::ALL[alu as usize]
    }

    /// Look a function up by its X11 name, with or without the `GX` prefix.
    pub fn from_name(name: &str) -> Option<Rop> {
        let name = name.strip_prefix("GX").unwrap_or(name);
        Self::ALL.into_iter().find(|rop| rop.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Rop::Clear => "clear",
            Rop::And => "and",
            Rop::AndReverse => "andReverse",
            Rop::Copy => "copy",
            Rop::AndInverted => "andInverted",
            Rop::Noop => "noop",
            Rop::Xor => "xor",
            Rop::Or => "or",
            Rop::Nor => "nor",
            Rop::Equiv => "equiv",
            Rop::Invert => "invert",
            Rop::OrReverse => "orReverse",
            Rop::CopyInverted => "copyInverted",
            Rop::OrInverted => "orInverted",
            Rop::Nand => "nand",
            Rop::Set => "set",
        }
    }

    /// The 4-bit code for `BLT_ROP`.
    #[inline(always)]
    pub fn hardware(self) -> u8 {
        translate(self)
    }
}

/// Map a logical function to the engine's ROP code.
#[inline(always)]
pub fn translate(rop: Rop) -> u8 {
    HW_ROP[rop as usize]
}

/// Apply a hardware ROP code bitwise to `src` and `dst`.
pub fn apply(code: u8, src: u32, dst: u32) -> u32 {
    let mut out = 0;
    if code & 0b1000 != 0 {
        out |= src & dst;
    }
    if code & 0b0100 != 0 {
        out |= src & !dst;
    }
    if code & 0b0010 != 0 {
        out |= !src & dst;
    }
    if code & 0b0001 != 0 {
        out |= !src & !dst;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_a_bijection_onto_four_bits() {
        let mut seen = [false; 16];
        for rop in Rop::ALL {
            let code = translate(rop);
            assert!(code < 16);
            assert!(!seen[code as usize], "{:?} maps to a duplicate code", rop);
            seen[code as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn well_known_codes() {
        assert_eq!(translate(Rop::Copy), 0x0C);
        assert_eq!(translate(Rop::Clear), 0x00);
        assert_eq!(translate(Rop::Set), 0x0F);
        assert_eq!(translate(Rop::Noop), 0x0A);
        assert_eq!(translate(Rop::Xor), 0x06);
    }

    #[test]
    fn alu_numbering_matches_variants() {
        for (i, rop) in Rop::ALL.iter().enumerate() {
            assert_eq!(Rop::from_alu(i as u8), *rop);
            assert_eq!(*rop as usize, i);
        }
    }

    #[test]
    #[should_panic]
    fn alu_out_of_range_is_fatal() {
        Rop::from_alu(16);
    }

    #[test]
    fn codes_agree_with_their_logic() {
        let (s, d) = (0b1100u32, 0b1010u32);
        let mask = 0b1111;
        let expect = |rop: Rop| -> u32 {
            match rop {
                Rop::Clear => 0,
                Rop::And => s & d,
                Rop::AndReverse => s & !d,
                Rop::Copy => s,
                Rop::AndInverted => !s & d,
                Rop::Noop => d,
                Rop::Xor => s ^ d,
                Rop::Or => s | d,
                Rop::Nor => !(s | d),
                Rop::Equiv => !s ^ d,
                Rop::Invert => !d,
                Rop::OrReverse => s | !d,
                Rop::CopyInverted => !s,
                Rop::OrInverted => !s | d,
                Rop::Nand => !(s & d),
                Rop::Set => !0,
            }
        };
        for rop in Rop::ALL {
            assert_eq!(apply(rop.hardware(), s, d) & mask, expect(rop) & mask, "{}", rop.name());
        }
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(Rop::from_name("GXcopy"), Some(Rop::Copy));
        assert_eq!(Rop::from_name("xor"), Some(Rop::Xor));
        assert_eq!(Rop::from_name("copyinverted"), Some(Rop::CopyInverted));
        assert_eq!(Rop::from_name("blend"), None);
    }
}
