use core::fmt::{Display, Formatter};

/// One bus access seen by the controller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Read8 { offset: usize, value: u8 },
    Write8 { offset: usize, value: u8 },
    Read16 { offset: usize, value: u16 },
    Write16 { offset: usize, value: u16 },
}

impl Access {
    pub fn offset(&self) -> usize {
        match *self {
            Access::Read8 { offset, .. }
            | Access::Write8 { offset, .. }
            | Access::Read16 { offset, .. }
            | Access::Write16 { offset, .. } => offset,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Access::Write8 { .. } | Access::Write16 { .. })
    }
}

impl Display for Access {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match *self {
            Access::Read8 { offset, value } => write!(f, "r8  ${:06X} -> {:#04x}", offset, value),
            Access::Write8 { offset, value } => write!(f, "w8  ${:06X} <- {:#04x}", offset, value),
            Access::Read16 { offset, value } => write!(f, "r16 ${:06X} -> {:#06x}", offset, value),
            Access::Write16 { offset, value } => write!(f, "w16 ${:06X} <- {:#06x}", offset, value),
        }
    }
}

/// Counters kept by the controller.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Stats {
    pub blits: u64,
    pub pixels: u64,
    pub refused: u64,
    pub status_polls: u64,
    pub drains: u64,
}
