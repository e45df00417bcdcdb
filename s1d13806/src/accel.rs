//! # Acceleration Framework Interface
//!
//! The framework decides what to accelerate and drives the driver through
//! [`AccelOps`], one call per framework hook. It learns what the driver can
//! do from [`Capabilities`], handed over once through an [`AccelRegistry`].
//!
//! | Hook                 | Contract                                           |
//! |----------------------|----------------------------------------------------|
//! | `prepare_solid`      | Validate and program colours, ROP and fill mode    |
//! | `solid`              | Fill one rectangle, blocking until done            |
//! | `done_solid`         | Drain the engine and post a marker                 |
//! | `prepare_copy`       | Validate, record surfaces and direction, set ROP   |
//! | `copy`               | Move one rectangle, blocking until done            |
//! | `done_copy`          | Forget the surfaces, drain, post a marker          |
//! | `upload_to_screen`   | Always declined                                    |
//! | `download_from_screen` | Always declined                                  |
//! | `wait_marker`        | Block until the engine is idle                     |
//!
//! Calls must come in prepare, execute, done order with one execute per
//! prepare. Anything else is a contract breach and panics.

use crate::{
    engine::{BltEngine, SurfaceRef},
    error::{Declined, InitError},
    geometry::Rect,
    mmio::RegisterIo,
    rop::Rop,
    surface::{FramebufferRegion, Pixmap, PlaneMask},
    sync::{IdleWait, Marker, SyncMarker},
};

/// Pixmap offsets and pitches must be multiples of this many bytes.
pub const PIXMAP_ALIGN: u32 = 4;

bitflags::bitflags! {
    /// What the framework may assume about the driver.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct AccelFlags: u32 {
        /// Pixmaps may live in offscreen video memory.
        const OFFSCREEN_PIXMAPS     = 1 << 0;
        /// Copies take one combined direction, not separate x and y flags.
        const TWO_BITBLT_DIRECTIONS = 1 << 2;
    }
}

/// Interface revision the capability table follows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AbiVersion {
    pub major: u8,
    pub minor: u8,
}

/// The driver's capability table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub version: AbiVersion,
    pub memory: FramebufferRegion,
    pub max_x: u32,
    pub max_y: u32,
    pub pixmap_offset_align: u32,
    pub pixmap_pitch_align: u32,
    pub flags: AccelFlags,
}

/// Receives the capability table at start-up.
pub trait AccelRegistry {
    /// Returns false to refuse the driver.
    fn register(&mut self, caps: &Capabilities) -> bool;
}

/// Framework hooks, with the framework's argument conventions.
pub trait AccelOps {
    fn prepare_solid<P: Pixmap + ?Sized>(
        &mut self,
        pixmap: &P,
        alu: Rop,
        plane_mask: PlaneMask,
        fg: u32,
    ) -> Result<(), Declined>;

    /// Fill the box from (`x1`, `y1`) inclusive to (`x2`, `y2`) exclusive.
    fn solid<P: Pixmap + ?Sized>(&mut self, pixmap: &P, x1: u32, y1: u32, x2: u32, y2: u32);

    fn done_solid<P: Pixmap + ?Sized>(&mut self, pixmap: &P);

    fn prepare_copy<P: Pixmap + ?Sized, Q: Pixmap + ?Sized>(
        &mut self,
        src: &P,
        dst: &Q,
        xdir: i32,
        ydir: i32,
        alu: Rop,
        plane_mask: PlaneMask,
    ) -> Result<(), Declined>;

    #[allow(clippy::too_many_arguments)]
    fn copy<P: Pixmap + ?Sized>(
        &mut self,
        dst: &P,
        sx: u32,
        sy: u32,
        dx: u32,
        dy: u32,
        width: u32,
        height: u32,
    );

    fn done_copy<P: Pixmap + ?Sized>(&mut self, dst: &P);

    #[allow(clippy::too_many_arguments)]
    fn upload_to_screen<P: Pixmap + ?Sized>(
        &mut self,
        dst: &P,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        src: &[u8],
        src_pitch: u32,
    ) -> Result<(), Declined>;

    #[allow(clippy::too_many_arguments)]
    fn download_from_screen<P: Pixmap + ?Sized>(
        &mut self,
        src: &P,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        dst: &mut [u8],
        dst_pitch: u32,
    ) -> Result<(), Declined>;

    fn wait_marker(&mut self, marker: Marker);
}

impl<R: RegisterIo, W: IdleWait, S: SyncMarker> BltEngine<R, W, S> {
    /// The capability table for the active mode.
    pub fn capabilities(&self) -> Capabilities {
        let mode = self.mode();
        Capabilities {
            version: AbiVersion { major: 2, minor: 0 },
            memory: *self.region(),
            max_x: mode.width - 1,
            max_y: mode.height - 1,
            pixmap_offset_align: PIXMAP_ALIGN,
            pixmap_pitch_align: PIXMAP_ALIGN,
            flags: AccelFlags::OFFSCREEN_PIXMAPS | AccelFlags::TWO_BITBLT_DIRECTIONS,
        }
    }

    /// Hand the capability table to the framework.
    pub fn register<F: AccelRegistry + ?Sized>(&self, registry: &mut F) -> Result<(), InitError> {
        let caps = self.capabilities();
        if !registry.register(&caps) {
            log::error!("failed to register BitBLT acceleration");
            return Err(InitError::RegistrationRefused);
        }
        log::info!("registered BitBLT acceleration");
        Ok(())
    }
}

impl<R: RegisterIo, W: IdleWait, S: SyncMarker> AccelOps for BltEngine<R, W, S> {
    fn prepare_solid<P: Pixmap + ?Sized>(
        &mut self,
        pixmap: &P,
        alu: Rop,
        plane_mask: PlaneMask,
        fg: u32,
    ) -> Result<(), Declined> {
        self.arm_solid(pixmap, alu, plane_mask, fg)
    }

    fn solid<P: Pixmap + ?Sized>(&mut self, pixmap: &P, x1: u32, y1: u32, x2: u32, y2: u32) {
        self.exec_solid(SurfaceRef::of(pixmap), Rect::from_corners(x1, y1, x2, y2));
    }

    fn done_solid<P: Pixmap + ?Sized>(&mut self, _pixmap: &P) {
        self.finish_solid();
    }

    fn prepare_copy<P: Pixmap + ?Sized, Q: Pixmap + ?Sized>(
        &mut self,
        src: &P,
        dst: &Q,
        xdir: i32,
        ydir: i32,
        alu: Rop,
        plane_mask: PlaneMask,
    ) -> Result<(), Declined> {
        self.arm_copy(src, dst, xdir, ydir, alu, plane_mask)
    }

    fn copy<P: Pixmap + ?Sized>(
        &mut self,
        dst: &P,
        sx: u32,
        sy: u32,
        dx: u32,
        dy: u32,
        width: u32,
        height: u32,
    ) {
        debug_assert!(
            self.pending_copy()
                .is_none_or(|ctx| ctx.dst == SurfaceRef::of(dst)),
            "copy destination differs from the prepared one"
        );
        self.exec_copy((sx, sy), (dx, dy), width, height);
    }

    fn done_copy<P: Pixmap + ?Sized>(&mut self, _dst: &P) {
        self.finish_copy();
    }

    fn upload_to_screen<P: Pixmap + ?Sized>(
        &mut self,
        dst: &P,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        src: &[u8],
        src_pitch: u32,
    ) -> Result<(), Declined> {
        BltEngine::upload_to_screen(self, dst, Rect::new(x, y, width, height), src, src_pitch)
    }

    fn download_from_screen<P: Pixmap + ?Sized>(
        &mut self,
        src: &P,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        dst: &mut [u8],
        dst_pitch: u32,
    ) -> Result<(), Declined> {
        BltEngine::download_from_screen(self, src, Rect::new(x, y, width, height), dst, dst_pitch)
    }

    fn wait_marker(&mut self, marker: Marker) {
        BltEngine::wait_marker(self, marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::Phase,
        regs::{BLT_HEIGHT, BLT_OPERATION, BLT_WIDTH, Operation},
        surface::{DisplayMode, Surface},
        sync::{BusyWait, SequentialMarkers},
        testing::RecordingBus,
    };

    struct Registry {
        accept: bool,
        seen: Option<Capabilities>,
    }

    impl AccelRegistry for Registry {
        fn register(&mut self, caps: &Capabilities) -> bool {
            self.seen = Some(*caps);
            self.accept
        }
    }

    fn engine() -> BltEngine<RecordingBus, BusyWait, SequentialMarkers> {
        let mode = DisplayMode::packed(800, 600, 16);
        let region = FramebufferRegion::for_mode(0x4000_0000, 0x14_0000, &mode);
        BltEngine::init(RecordingBus::new(), BusyWait, SequentialMarkers::new(), mode, region).unwrap()
    }

    #[test]
    fn capability_table() {
        let engine = engine();
        let caps = engine.capabilities();
        assert_eq!(caps.version, AbiVersion { major: 2, minor: 0 });
        assert_eq!(caps.max_x, 799);
        assert_eq!(caps.max_y, 599);
        assert_eq!(caps.pixmap_offset_align, 4);
        assert_eq!(caps.pixmap_pitch_align, 4);
        assert_eq!(caps.memory.base, 0x4000_0000);
        assert_eq!(caps.memory.offscreen_base, 800 * 600 * 2);
        assert!(caps.flags.contains(AccelFlags::OFFSCREEN_PIXMAPS));
        assert!(caps.flags.contains(AccelFlags::TWO_BITBLT_DIRECTIONS));
    }

    #[test]
    fn registration() {
        let engine = engine();

        let mut accepting = Registry { accept: true, seen: None };
        assert_eq!(engine.register(&mut accepting), Ok(()));
        assert_eq!(accepting.seen, Some(engine.capabilities()));

        let mut refusing = Registry { accept: false, seen: None };
        assert_eq!(engine.register(&mut refusing), Err(InitError::RegistrationRefused));
    }

    #[test]
    fn framework_hooks_drive_the_state_machine() {
        let mut engine = engine();
        let screen = Surface::screen(engine.mode());

        AccelOps::prepare_solid(&mut engine, &screen, Rop::Copy, PlaneMask::SOLID, 0).unwrap();
        AccelOps::solid(&mut engine, &screen, 0, 0, 800, 600);
        assert_eq!(engine.registers().get16(BLT_WIDTH), 799);
        assert_eq!(engine.registers().get16(BLT_HEIGHT), 599);
        AccelOps::done_solid(&mut engine, &screen);
        assert_eq!(engine.phase(), Phase::Idle);

        AccelOps::prepare_copy(&mut engine, &screen, &screen, 1, 1, Rop::Copy, PlaneMask::SOLID)
            .unwrap();
        AccelOps::copy(&mut engine, &screen, 0, 0, 100, 100, 50, 50);
        assert_eq!(
            engine.registers().get8(BLT_OPERATION),
            Operation::MovePositiveRop as u8
        );
        AccelOps::done_copy(&mut engine, &screen);
        assert!(engine.pending_copy().is_none());

        AccelOps::wait_marker(&mut engine, Marker(7));
    }

    #[test]
    fn inverted_corners_fill_nothing() {
        let mut engine = engine();
        let screen = Surface::screen(engine.mode());

        AccelOps::prepare_solid(&mut engine, &screen, Rop::Copy, PlaneMask::SOLID, 0xFFFF).unwrap();
        engine.registers_mut().clear_log();
        AccelOps::solid(&mut engine, &screen, 20, 5, 10, 15);
        assert!(engine.registers().log.is_empty());
        assert_eq!(engine.phase(), Phase::SolidActive);

        AccelOps::done_solid(&mut engine, &screen);
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn framework_host_transfers_decline() {
        let mut engine = engine();
        let screen = Surface::screen(engine.mode());
        let mut buf = [0u8; 32];
        assert_eq!(
            AccelOps::upload_to_screen(&mut engine, &screen, 0, 0, 4, 4, &buf, 8),
            Err(Declined::HostTransfer)
        );
        assert_eq!(
            AccelOps::download_from_screen(&mut engine, &screen, 0, 0, 4, 4, &mut buf, 8),
            Err(Declined::HostTransfer)
        );
    }

    #[test]
    #[should_panic]
    fn second_execute_is_a_contract_breach() {
        let mut engine = engine();
        let screen = Surface::screen(engine.mode());
        AccelOps::prepare_solid(&mut engine, &screen, Rop::Copy, PlaneMask::SOLID, 0).unwrap();
        AccelOps::solid(&mut engine, &screen, 0, 0, 8, 8);
        AccelOps::solid(&mut engine, &screen, 8, 8, 16, 16);
    }
}
