use std::sync::{
    atomic::{
        AtomicBool,
        Ordering
    },
    Arc
};

use crate::session::{
    SessionError,
    SnapshotSource
};

use super::{
    overlay::OverlayBox,
    shapes::{
        AgentShape,
        ShapeBuilder
    }
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    WindowClosed,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped(LoopExit),
}

/// Drawing surface driven by [`FrameLoopController`], one frame per `present`.
pub trait FrameRenderer {
    /// Pending quit request from the window, if any.
    fn poll_quit(&mut self) -> Option<LoopExit>;

    fn draw_background(&mut self);

    fn draw_overlay_box(&mut self, overlay_box: &OverlayBox);

    fn draw_shape(&mut self, shape: &AgentShape);

    fn present(&mut self);
}

pub struct FrameLoopController<'a, R, S> {
    renderer: &'a mut R,
    source: &'a mut S,
    shapes: ShapeBuilder,
    overlay: Vec<OverlayBox>,
    interrupt: Arc<AtomicBool>,
    state: LoopState,
    frames: u64,
}

impl<'a, R, S> FrameLoopController<'a, R, S>
where
    R: FrameRenderer,
    S: SnapshotSource
{
    pub fn new(
        renderer: &'a mut R,
        source: &'a mut S,
        shapes: ShapeBuilder,
        overlay: Vec<OverlayBox>,
        interrupt: Arc<AtomicBool>,
    ) -> Self {
        Self {
            renderer,
            source,
            shapes,
            overlay,
            interrupt,
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs frames until a quit request, or until the snapshot source fails.
    pub fn run(&mut self) -> Result<LoopExit, SessionError> {
        loop {
            if let LoopState::Stopped(exit) = self.state {
                return Ok(exit);
            }
            self.step()?;
        }
    }

    /// One iteration: drain signals, draw background and overlay, fetch, draw agents, present.
    pub fn step(&mut self) -> Result<LoopState, SessionError> {
        if let Some(exit) = self.drain_signals() {
            log::debug!("Frame loop stopped after {} frames, reason={exit:?}", self.frames);
            self.state = LoopState::Stopped(exit);
            return Ok(self.state);
        }

        self.renderer.draw_background();
        for overlay_box in &self.overlay {
            self.renderer.draw_overlay_box(overlay_box);
        }

        let snapshot = self.source.read_snapshot()?;
        let partition = snapshot.partition();
        log::trace!(
            "Frame {}: {} pedestrians, {} vehicles",
            snapshot.frame_number,
            partition.pedestrians.len(),
            partition.vehicles.len()
        );

        for position in partition.pedestrians {
            let shape = AgentShape::Pedestrian(self.shapes.build_pedestrian(position));
            self.renderer.draw_shape(&shape);
        }
        for pose in &partition.vehicles {
            let shape = AgentShape::Vehicle(self.shapes.build_vehicle(pose));
            self.renderer.draw_shape(&shape);
        }

        self.renderer.present();
        self.frames += 1;
        Ok(self.state)
    }

    fn drain_signals(&mut self) -> Option<LoopExit> {
        if self.interrupt.load(Ordering::SeqCst) {
            return Some(LoopExit::Interrupted);
        }
        self.renderer.poll_quit()
    }
}
