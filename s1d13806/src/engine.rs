//! # BitBLT Engine
//!
//! [`BltEngine`] is the device context: it owns the register block, knows
//! the active mode, and carries the copy state that lives between a
//! prepare and its done.
//!
//! Every operation goes Idle → Prepared → Active → Idle. Solid fills and
//! copies block until the hardware finishes, so at most one blit is ever in
//! flight and two consecutive calls never overlap.
//!
//! ```ignore
//! let mut engine = BltEngine::init(mmio, BusyWait, markers, mode, region)?;
//! let screen = Surface::screen(&mode);
//!
//! engine
//!     .begin_solid(&screen, Rop::Copy, PlaneMask::SOLID, 0x0000)?
//!     .solid(Rect::new(0, 0, 800, 600))
//!     .done();
//! ```

use log::{debug, info};

use crate::{
    error::{Declined, InitError},
    geometry::{Direction, Rect, encode_extent, split_address, start_address, stride_pixels},
    mmio::RegisterIo,
    regs::{
        BLT_BG_COLOR, BLT_CTRL0, BLT_CTRL1, BLT_DST_START01, BLT_DST_START2, BLT_FG_COLOR,
        BLT_HEIGHT, BLT_OPERATION, BLT_ROP, BLT_SRC_START01, BLT_SRC_START2, BLT_STRIDE,
        BLT_WIDTH, Ctrl0, Ctrl1, Operation, PRODUCT_CODE, REV_CODE,
    },
    rop::Rop,
    session::{PreparedCopy, PreparedSolid},
    surface::{DisplayMode, FramebufferRegion, Pixmap, PlaneMask},
    sync::{IdleWait, Marker, SyncMarker, drain},
};

/// Where the engine is in its prepare/execute/done cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SolidPrepared,
    SolidActive,
    CopyPrepared,
    CopyActive,
}

/// The geometry of a surface, captured at prepare time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SurfaceRef {
    pub offset: u32,
    pub pitch: u32,
}

impl SurfaceRef {
    pub fn of<P: Pixmap + ?Sized>(pixmap: &P) -> Self {
        Self {
            offset: pixmap.offset(),
            pitch: pixmap.pitch(),
        }
    }
}

/// Copy state valid from a prepare to its done.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CopyContext {
    pub src: SurfaceRef,
    pub dst: SurfaceRef,
    pub direction: Direction,
}

/// Device context for one S1D13806.
///
/// Single-threaded: nothing here is locked. Callers sharing an engine
/// between threads must serialize access themselves.
pub struct BltEngine<R: RegisterIo, W: IdleWait, S: SyncMarker> {
    regs: R,
    wait: W,
    sync: S,
    mode: DisplayMode,
    region: FramebufferRegion,
    bytes_per_pixel: u32,
    screen_stride: u32,
    phase: Phase,
    copy: Option<CopyContext>,
}

impl<R: RegisterIo, W: IdleWait, S: SyncMarker> BltEngine<R, W, S> {
    /// Bring the BitBLT engine into a known state and clear the screen.
    ///
    /// Checks the controller's revision code, programs the colour format and
    /// screen stride, then solid-fills the visible screen with 0 and waits
    /// for it to finish.
    pub fn init(
        mut regs: R,
        wait: W,
        sync: S,
        mode: DisplayMode,
        region: FramebufferRegion,
    ) -> Result<Self, InitError> {
        mode.validate()?;
        region.validate(&mode)?;

        let rev_code = regs.read8(REV_CODE);
        if rev_code >> 2 != PRODUCT_CODE {
            return Err(InitError::UnknownController { rev_code });
        }

        let mut engine = Self {
            regs,
            wait,
            sync,
            mode,
            region,
            bytes_per_pixel: mode.bytes_per_pixel(),
            screen_stride: mode.byte_stride,
            phase: Phase::Idle,
            copy: None,
        };
        engine.reset();

        info!(
            "BitBLT engine ready: rev {:#04x}, {}x{} at {} bpp, stride {} bytes",
            rev_code, mode.width, mode.height, mode.bits_per_pixel, mode.byte_stride
        );
        debug!(
            "video memory at {:#x}, {:#x} bytes, offscreen from {:#x}",
            region.base, region.size, region.offscreen_base
        );

        Ok(engine)
    }

    fn reset(&mut self) {
        let format = if self.bytes_per_pixel == 2 {
            Ctrl1::COLOR_16BPP
        } else {
            Ctrl1::empty()
        };

        self.regs.write8(BLT_CTRL0, Ctrl0::empty().bits());
        self.regs.write8(BLT_CTRL1, format.bits());
        self.regs
            .write16(BLT_STRIDE, stride_pixels(self.screen_stride, self.bytes_per_pixel));

        // clear the visible screen
        let (lo, hi) = split_address(0);
        self.regs.write16(BLT_DST_START01, lo);
        self.regs.write8(BLT_DST_START2, hi);
        self.regs.write16(BLT_FG_COLOR, 0x0000);
        self.regs.write8(BLT_OPERATION, Operation::SolidFill as u8);
        self.regs.write16(BLT_WIDTH, encode_extent(self.mode.width));
        self.regs.write16(BLT_HEIGHT, encode_extent(self.mode.height));
        self.regs.write8(BLT_CTRL0, Ctrl0::ACTIVE.bits());

        self.wait.wait_idle(&mut self.regs);
    }

    /// Wait for the engine and post a marker; the screen is ready for drawing.
    pub fn enable(&mut self) -> Marker {
        debug!("enable");
        self.wait.wait_idle(&mut self.regs);
        self.sync.mark_sync()
    }

    pub fn disable(&mut self) {
        debug!("disable");
    }

    /// Tear the engine down and hand back the register block.
    pub fn fini(self) -> R {
        debug!("fini");
        self.regs
    }

    pub fn mode(&self) -> &DisplayMode {
        &self.mode
    }

    pub fn region(&self) -> &FramebufferRegion {
        &self.region
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Copy state left by a prepare, if a copy is in progress.
    pub fn pending_copy(&self) -> Option<&CopyContext> {
        self.copy.as_ref()
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    pub fn sync(&self) -> &S {
        &self.sync
    }

    /// Block until the engine is idle. Every marker is satisfied once the
    /// single in-flight operation, if any, has finished.
    pub fn wait_marker(&mut self, marker: Marker) {
        debug!("wait for marker {}", marker.0);
        self.wait.wait_idle(&mut self.regs);
    }

    /// Start a solid fill session on `pixmap`.
    pub fn begin_solid<P: Pixmap + ?Sized>(
        &mut self,
        pixmap: &P,
        rop: Rop,
        mask: PlaneMask,
        color: u32,
    ) -> Result<PreparedSolid<'_, R, W, S>, Declined> {
        self.arm_solid(pixmap, rop, mask, color)?;
        Ok(PreparedSolid::new(self, SurfaceRef::of(pixmap)))
    }

    /// Start a copy session from `src` to `dst`.
    ///
    /// # Panics
    ///
    /// If `xdir` and `ydir` have different signs. The engine has a single
    /// direction flag.
    pub fn begin_copy<P: Pixmap + ?Sized, Q: Pixmap + ?Sized>(
        &mut self,
        src: &P,
        dst: &Q,
        xdir: i32,
        ydir: i32,
        rop: Rop,
        mask: PlaneMask,
    ) -> Result<PreparedCopy<'_, R, W, S>, Declined> {
        self.arm_copy(src, dst, xdir, ydir, rop, mask)?;
        Ok(PreparedCopy::new(self))
    }

    /// Host transfers always go through the software path.
    pub fn upload_to_screen<P: Pixmap + ?Sized>(
        &mut self,
        dst: &P,
        rect: Rect,
        src: &[u8],
        src_pitch: u32,
    ) -> Result<(), Declined> {
        debug!(
            "upload {:?} from {} bytes, pitch {}; dst offset {:#x} pitch {}",
            rect,
            src.len(),
            src_pitch,
            dst.offset(),
            dst.pitch()
        );
        Err(Declined::HostTransfer)
    }

    pub fn download_from_screen<P: Pixmap + ?Sized>(
        &mut self,
        src: &P,
        rect: Rect,
        dst: &mut [u8],
        dst_pitch: u32,
    ) -> Result<(), Declined> {
        debug!(
            "download {:?} into {} bytes, pitch {}; src offset {:#x} pitch {}",
            rect,
            dst.len(),
            dst_pitch,
            src.offset(),
            src.pitch()
        );
        Err(Declined::HostTransfer)
    }

    fn expect_phase(&self, want: &[Phase], what: &str) {
        assert!(
            want.contains(&self.phase),
            "{} called while the engine is {:?}",
            what,
            self.phase
        );
    }

    fn check_depth<P: Pixmap + ?Sized>(&self, pixmap: &P) -> Result<(), Declined> {
        let expected = (self.bytes_per_pixel * 8) as u8;
        let found = pixmap.bits_per_pixel();
        if found != expected {
            return Err(Declined::Depth { expected, found });
        }
        Ok(())
    }

    fn check_mask<P: Pixmap + ?Sized>(pixmap: &P, mask: PlaneMask) -> Result<(), Declined> {
        let depth = pixmap.depth();
        if !mask.is_solid(depth) {
            return Err(Declined::PartialPlaneMask { mask: mask.0, depth });
        }
        Ok(())
    }

    pub(crate) fn arm_solid<P: Pixmap + ?Sized>(
        &mut self,
        pixmap: &P,
        rop: Rop,
        mask: PlaneMask,
        color: u32,
    ) -> Result<(), Declined> {
        self.expect_phase(&[Phase::Idle], "prepare solid");
        debug!(
            "prepare solid: rop {} color {:#06x} bpp {}",
            rop.name(),
            color,
            pixmap.bits_per_pixel()
        );

        self.check_depth(pixmap)?;
        Self::check_mask(pixmap, mask)?;

        self.wait.wait_idle(&mut self.regs);

        // background too, so ROPs that read it see the same colour
        let color = (color & 0xFFFF) as u16;
        self.regs.write16(BLT_FG_COLOR, color);
        self.regs.write16(BLT_BG_COLOR, color);

        self.regs.write8(BLT_ROP, rop.hardware());

        // solid fill ignores the ROP, so noop has to go through a pattern fill
        let operation = if rop == Rop::Noop {
            Operation::PatternFillRop
        } else {
            Operation::SolidFill
        };
        self.regs.write8(BLT_OPERATION, operation as u8);

        self.phase = Phase::SolidPrepared;
        Ok(())
    }

    pub(crate) fn exec_solid(&mut self, target: SurfaceRef, rect: Rect) {
        self.expect_phase(&[Phase::SolidPrepared], "solid");
        self.phase = Phase::SolidActive;
        debug!("solid {:?}", rect);

        if rect.is_empty() {
            return;
        }

        let bpp = self.bytes_per_pixel;
        let dst = start_address(target.offset, target.pitch, bpp, &rect, Direction::Positive);

        // destination is linear
        let mode = Ctrl0::from_bits_truncate(self.regs.read8(BLT_CTRL0))
            - Ctrl0::DST_ROTATED
            - Ctrl0::ACTIVE;
        self.regs.write8(BLT_CTRL0, mode.bits());

        self.regs.write16(BLT_STRIDE, stride_pixels(target.pitch, bpp));

        let (lo, hi) = split_address(dst);
        self.regs.write16(BLT_DST_START01, lo);
        self.regs.write8(BLT_DST_START2, hi);

        self.regs.write16(BLT_WIDTH, encode_extent(rect.width));
        self.regs.write16(BLT_HEIGHT, encode_extent(rect.height));

        self.regs.write8(BLT_CTRL0, (mode | Ctrl0::ACTIVE).bits());
        self.wait.wait_idle(&mut self.regs);
    }

    pub(crate) fn finish_solid(&mut self) -> Marker {
        self.expect_phase(&[Phase::SolidPrepared, Phase::SolidActive], "done solid");
        debug!("done solid");

        drain(&mut self.regs);
        self.phase = Phase::Idle;
        self.sync.mark_sync()
    }

    pub(crate) fn arm_copy<P: Pixmap + ?Sized, Q: Pixmap + ?Sized>(
        &mut self,
        src: &P,
        dst: &Q,
        xdir: i32,
        ydir: i32,
        rop: Rop,
        mask: PlaneMask,
    ) -> Result<(), Declined> {
        self.expect_phase(&[Phase::Idle], "prepare copy");
        assert_eq!(
            xdir < 0,
            ydir < 0,
            "x and y copy directions must agree (xdir {xdir}, ydir {ydir})"
        );
        debug!(
            "prepare copy: negative {} rop {}; src {:#08x}/{}/{} dst {:#08x}/{}/{}",
            xdir < 0,
            rop.name(),
            src.offset(),
            src.pitch(),
            src.bits_per_pixel(),
            dst.offset(),
            dst.pitch(),
            dst.bits_per_pixel()
        );

        self.check_depth(src)?;
        self.check_depth(dst)?;
        Self::check_mask(dst, mask)?;
        if src.pitch() != dst.pitch() {
            return Err(Declined::PitchMismatch {
                src: src.pitch(),
                dst: dst.pitch(),
            });
        }

        self.copy = Some(CopyContext {
            src: SurfaceRef::of(src),
            dst: SurfaceRef::of(dst),
            direction: Direction::from_sign(xdir),
        });

        self.wait.wait_idle(&mut self.regs);
        self.sync.mark_sync();
        self.regs.write8(BLT_ROP, rop.hardware());

        self.phase = Phase::CopyPrepared;
        Ok(())
    }

    pub(crate) fn exec_copy(&mut self, src_pos: (u32, u32), dst_pos: (u32, u32), width: u32, height: u32) {
        self.expect_phase(&[Phase::CopyPrepared], "copy");
        self.phase = Phase::CopyActive;
        debug!(
            "copy {}x{} ({}, {}) -> ({}, {})",
            width, height, src_pos.0, src_pos.1, dst_pos.0, dst_pos.1
        );

        if width == 0 || height == 0 {
            return;
        }

        let Some(ctx) = self.copy else {
            panic!("copy state missing after prepare");
        };

        let bpp = self.bytes_per_pixel;
        let src_rect = Rect::new(src_pos.0, src_pos.1, width, height);
        let dst_rect = Rect::new(dst_pos.0, dst_pos.1, width, height);
        let src = start_address(ctx.src.offset, ctx.src.pitch, bpp, &src_rect, ctx.direction);
        let dst = start_address(ctx.dst.offset, ctx.dst.pitch, bpp, &dst_rect, ctx.direction);

        // source and destination are linear
        let mode = Ctrl0::from_bits_truncate(self.regs.read8(BLT_CTRL0))
            - Ctrl0::SRC_ROTATED
            - Ctrl0::DST_ROTATED
            - Ctrl0::ACTIVE;
        self.regs.write8(BLT_CTRL0, mode.bits());

        // pitches were checked equal at prepare time
        self.regs.write16(BLT_STRIDE, stride_pixels(ctx.src.pitch, bpp));

        let (lo, hi) = split_address(src);
        self.regs.write16(BLT_SRC_START01, lo);
        self.regs.write8(BLT_SRC_START2, hi);
        let (lo, hi) = split_address(dst);
        self.regs.write16(BLT_DST_START01, lo);
        self.regs.write8(BLT_DST_START2, hi);

        self.regs.write16(BLT_WIDTH, encode_extent(width));
        self.regs.write16(BLT_HEIGHT, encode_extent(height));

        let operation = match ctx.direction {
            Direction::Positive => Operation::MovePositiveRop,
            Direction::Negative => Operation::MoveNegativeRop,
        };
        self.regs.write8(BLT_OPERATION, operation as u8);

        self.regs.write8(BLT_CTRL0, (mode | Ctrl0::ACTIVE).bits());
        self.wait.wait_idle(&mut self.regs);
    }

    pub(crate) fn finish_copy(&mut self) -> Marker {
        self.expect_phase(&[Phase::CopyPrepared, Phase::CopyActive], "done copy");
        debug!("done copy");

        self.copy = None;
        drain(&mut self.regs);
        self.phase = Phase::Idle;
        self.sync.mark_sync()
    }
}
