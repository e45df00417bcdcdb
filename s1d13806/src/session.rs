//! # Blit Sessions
//!
//! A prepare hands out a session that borrows the engine. The session only
//! allows one execute, and dropping it at any point runs the matching done,
//! so the engine's copy state can never outlive the operation that set it.
//!
//! ```ignore
//! let marker = engine
//!     .begin_copy(&screen, &screen, -1, -1, Rop::Copy, PlaneMask::SOLID)?
//!     .copy((10, 10), (0, 0), 5, 5)
//!     .done();
//! ```

use crate::{
    engine::{BltEngine, SurfaceRef},
    geometry::Rect,
    mmio::RegisterIo,
    sync::{IdleWait, Marker, SyncMarker},
};

/// A prepared solid fill. Call [`solid`](Self::solid) once.
pub struct PreparedSolid<'a, R: RegisterIo, W: IdleWait, S: SyncMarker> {
    /// `Some` until the session is consumed or dropped.
    engine: Option<&'a mut BltEngine<R, W, S>>,
    target: SurfaceRef,
}

/// A finished solid fill waiting for [`done`](Self::done).
pub struct ExecutedSolid<'a, R: RegisterIo, W: IdleWait, S: SyncMarker> {
    engine: Option<&'a mut BltEngine<R, W, S>>,
}

impl<'a, R: RegisterIo, W: IdleWait, S: SyncMarker> PreparedSolid<'a, R, W, S> {
    pub(crate) fn new(engine: &'a mut BltEngine<R, W, S>, target: SurfaceRef) -> Self {
        Self {
            engine: Some(engine),
            target,
        }
    }

    /// Fill `rect` and wait for the engine. Empty rectangles do nothing.
    pub fn solid(mut self, rect: Rect) -> ExecutedSolid<'a, R, W, S> {
        let engine = self.take_engine();
        engine.exec_solid(self.target, rect);
        ExecutedSolid { engine: Some(engine) }
    }

    /// Skip the fill and finish.
    pub fn done(mut self) -> Marker {
        self.take_engine().finish_solid()
    }

    fn take_engine(&mut self) -> &'a mut BltEngine<R, W, S> {
        let Some(engine) = self.engine.take() else {
            unreachable!("solid session used after it finished");
        };
        engine
    }
}

impl<'a, R: RegisterIo, W: IdleWait, S: SyncMarker> ExecutedSolid<'a, R, W, S> {
    /// Drain the engine and post a marker.
    pub fn done(mut self) -> Marker {
        let Some(engine) = self.engine.take() else {
            unreachable!("solid session used after it finished");
        };
        engine.finish_solid()
    }
}

impl<R: RegisterIo, W: IdleWait, S: SyncMarker> Drop for PreparedSolid<'_, R, W, S> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.finish_solid();
        }
    }
}

impl<R: RegisterIo, W: IdleWait, S: SyncMarker> Drop for ExecutedSolid<'_, R, W, S> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.finish_solid();
        }
    }
}

/// A prepared copy. Call [`copy`](Self::copy) once.
pub struct PreparedCopy<'a, R: RegisterIo, W: IdleWait, S: SyncMarker> {
    engine: Option<&'a mut BltEngine<R, W, S>>,
}

/// A finished copy waiting for [`done`](Self::done).
pub struct ExecutedCopy<'a, R: RegisterIo, W: IdleWait, S: SyncMarker> {
    engine: Option<&'a mut BltEngine<R, W, S>>,
}

impl<'a, R: RegisterIo, W: IdleWait, S: SyncMarker> PreparedCopy<'a, R, W, S> {
    pub(crate) fn new(engine: &'a mut BltEngine<R, W, S>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// Copy a `width` x `height` block from `src` in the source surface to
    /// `dst` in the destination surface, then wait for the engine.
    pub fn copy(
        mut self,
        src: (u32, u32),
        dst: (u32, u32),
        width: u32,
        height: u32,
    ) -> ExecutedCopy<'a, R, W, S> {
        let engine = self.take_engine();
        engine.exec_copy(src, dst, width, height);
        ExecutedCopy { engine: Some(engine) }
    }

    /// Skip the copy and finish.
    pub fn done(mut self) -> Marker {
        self.take_engine().finish_copy()
    }

    fn take_engine(&mut self) -> &'a mut BltEngine<R, W, S> {
        let Some(engine) = self.engine.take() else {
            unreachable!("copy session used after it finished");
        };
        engine
    }
}

impl<'a, R: RegisterIo, W: IdleWait, S: SyncMarker> ExecutedCopy<'a, R, W, S> {
    /// Forget the copy state, drain the engine and post a marker.
    pub fn done(mut self) -> Marker {
        let Some(engine) = self.engine.take() else {
            unreachable!("copy session used after it finished");
        };
        engine.finish_copy()
    }
}

impl<R: RegisterIo, W: IdleWait, S: SyncMarker> Drop for PreparedCopy<'_, R, W, S> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.finish_copy();
        }
    }
}

impl<R: RegisterIo, W: IdleWait, S: SyncMarker> Drop for ExecutedCopy<'_, R, W, S> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.finish_copy();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        engine::{BltEngine, Phase},
        error::Declined,
        geometry::Rect,
        regs::{BLT_HEIGHT, BLT_WIDTH},
        rop::Rop,
        surface::{DisplayMode, FramebufferRegion, PlaneMask, Surface},
        sync::{BusyWait, Marker, SequentialMarkers},
        testing::RecordingBus,
    };

    fn engine() -> BltEngine<RecordingBus, BusyWait, SequentialMarkers> {
        let mode = DisplayMode::packed(320, 240, 16);
        let region = FramebufferRegion::for_mode(0, 0x14_0000, &mode);
        BltEngine::init(RecordingBus::new(), BusyWait, SequentialMarkers::new(), mode, region).unwrap()
    }

    #[test]
    fn solid_session_runs_the_full_cycle() {
        let mut engine = engine();
        let screen = Surface::screen(engine.mode());

        let marker = engine
            .begin_solid(&screen, Rop::Copy, PlaneMask::SOLID, 0xFFFF)
            .unwrap()
            .solid(Rect::new(0, 0, 320, 240))
            .done();

        assert_eq!(Some(marker), engine.sync().last());
        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.registers().get16(BLT_WIDTH), 319);
        assert_eq!(engine.registers().get16(BLT_HEIGHT), 239);
    }

    #[test]
    fn dropping_a_copy_session_clears_its_state() {
        let mut engine = engine();
        let screen = Surface::screen(engine.mode());

        {
            let prepared = engine
                .begin_copy(&screen, &screen, -1, -1, Rop::Copy, PlaneMask::SOLID)
                .unwrap();
            let _executed = prepared.copy((10, 10), (0, 0), 5, 5);
        }

        assert_eq!(engine.phase(), Phase::Idle);
        assert!(engine.pending_copy().is_none());
    }

    #[test]
    fn unused_prepare_still_finishes() {
        let mut engine = engine();
        let screen = Surface::screen(engine.mode());

        let before = engine.sync().last();
        let marker = engine
            .begin_solid(&screen, Rop::Set, PlaneMask::SOLID, 0)
            .unwrap()
            .done();
        assert!(Some(marker) > before);
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn every_done_posts_a_fresh_marker() {
        let mut engine = engine();
        let screen = Surface::screen(engine.mode());

        let skipped_copy: Marker = engine
            .begin_copy(&screen, &screen, 1, 1, Rop::Copy, PlaneMask::SOLID)
            .unwrap()
            .done();
        let copied: Marker = engine
            .begin_copy(&screen, &screen, 1, 1, Rop::Copy, PlaneMask::SOLID)
            .unwrap()
            .copy((0, 0), (8, 8), 4, 4)
            .done();
        let filled: Marker = engine
            .begin_solid(&screen, Rop::Copy, PlaneMask::SOLID, 0)
            .unwrap()
            .solid(Rect::new(0, 0, 4, 4))
            .done();

        assert!(skipped_copy < copied && copied < filled);
        assert_eq!(engine.sync().last(), Some(filled));
        assert!(engine.pending_copy().is_none());
    }

    #[test]
    fn declined_prepare_leaves_engine_idle() {
        let mut engine = engine();
        let screen = Surface::screen(engine.mode());
        let other = Surface::new(0x2_5800, 256, 16, 128, 128);

        let result = engine.begin_copy(&screen, &other, 1, 1, Rop::Copy, PlaneMask::SOLID);
        assert_eq!(
            result.err(),
            Some(Declined::PitchMismatch { src: 640, dst: 256 })
        );
        assert_eq!(engine.phase(), Phase::Idle);
    }
}
