use core::fmt;

/// Reasons the driver declines to accelerate a request.
///
/// None of these are failures: the caller is expected to fall back to its
/// software path. No register has been touched when one is returned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Declined {
    /// Surface bits per pixel differs from the active mode.
    Depth { expected: u8, found: u8 },
    /// Some colour planes are write-protected.
    PartialPlaneMask { mask: u32, depth: u8 },
    /// Source and destination pitch differ; there is only one stride register.
    PitchMismatch { src: u32, dst: u32 },
    /// Host to video memory transfers and the reverse are not accelerated.
    HostTransfer,
}

impl fmt::Display for Declined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declined::Depth { expected, found } => {
                write!(f, "surface is {found} bpp, engine is configured for {expected} bpp")
            }
            Declined::PartialPlaneMask { mask, depth } => {
                write!(f, "plane mask {mask:#x} is not solid at depth {depth}")
            }
            Declined::PitchMismatch { src, dst } => {
                write!(f, "source pitch {src} differs from destination pitch {dst}")
            }
            Declined::HostTransfer => write!(f, "host transfers are not accelerated"),
        }
    }
}

/// Driver start-up failures. There is no degraded mode: any of these means
/// acceleration is unavailable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitError {
    /// The register window base is null.
    Unmapped,
    /// The register window base is not 16-bit aligned.
    MisalignedWindow(usize),
    /// The register window does not cover the BitBLT data port.
    WindowTooSmall(usize),
    /// `REV_CODE` does not identify an S1D13806.
    UnknownController { rev_code: u8 },
    /// The BitBLT engine only handles 8 and 16 bpp.
    UnsupportedDepth(u8),
    /// Mode or memory region values are inconsistent.
    BadGeometry(&'static str),
    /// The acceleration framework refused the capability table.
    RegistrationRefused,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Unmapped => write!(f, "register window is not mapped"),
            InitError::MisalignedWindow(addr) => {
                write!(f, "register window at {addr:#x} is not 16-bit aligned")
            }
            InitError::WindowTooSmall(len) => {
                write!(f, "register window of {len:#x} bytes does not reach the BitBLT data port")
            }
            InitError::UnknownController { rev_code } => {
                write!(f, "REV_CODE {rev_code:#04x} is not an S1D13806")
            }
            InitError::UnsupportedDepth(bpp) => write!(f, "{bpp} bpp modes cannot be accelerated"),
            InitError::BadGeometry(what) => write!(f, "bad geometry: {what}"),
            InitError::RegistrationRefused => write!(f, "failed to register acceleration"),
        }
    }
}

impl core::error::Error for Declined {}
impl core::error::Error for InitError {}
