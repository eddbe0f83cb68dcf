use std::time::Duration;

use crate::{
    game::{
        scene::{
            Scene,
            SceneLayout
        },
        snapshot::FrameSnapshot
    },
    session::{
        SceneDescription,
        SessionSettings
    }
};

/// Simulated time advanced per tick, regardless of wall clock jitter.
pub const SIMULATION_STEP: Duration = Duration::from_millis(32);

#[derive(Debug, PartialEq)]
pub enum SnapshotRead {
    Fresh(FrameSnapshot),
    /// The reader already has the current frame.
    Unchanged,
    NotConfigured,
}

/// Episode shared by all sessions of one server. `Configure` replaces it.
#[derive(Debug)]
pub struct SimulationState {
    layout: SceneLayout,
    scene: Option<Scene>,
    synchronous: bool,
    frame_tx: tokio::sync::watch::Sender<u64>,
}

impl SimulationState {
    pub fn new(layout: SceneLayout) -> Self {
        let (frame_tx, _) = tokio::sync::watch::channel(0);
        Self {
            layout,
            scene: None,
            synchronous: false,
            frame_tx,
        }
    }

    /// Receiver notified with the frame number after every tick.
    pub fn subscribe_frames(&self) -> tokio::sync::watch::Receiver<u64> {
        self.frame_tx.subscribe()
    }

    pub fn configure(&mut self, settings: &SessionSettings) -> SceneDescription {
        let mut settings = settings.clone();
        if settings.seed_vehicles.is_none() || settings.seed_pedestrians.is_none() {
            settings.randomize_seeds();
        }
        log::info!(
            "New episode: weather={}, quality={:?}, synchronous={}",
            settings.weather_id, settings.quality_level, settings.synchronous_mode
        );

        let scene = Scene::new(self.layout.clone(), &settings);
        let description = scene.description();
        self.frame_tx.send_replace(scene.frame_number());
        self.scene = Some(scene);
        self.synchronous = settings.synchronous_mode;
        description
    }

    pub fn start_spot_count(&self) -> usize {
        self.layout.start_spot_count
    }

    /// Fixed-rate tick, skipped in synchronous mode where reads drive the clock.
    pub fn tick(&mut self) {
        if self.synchronous {
            return;
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.tick(SIMULATION_STEP);
            self.frame_tx.send_replace(scene.frame_number());
        }
    }

    /// Snapshot newer than `last_sent`. Synchronous reads step the scene and are always fresh.
    pub fn read_snapshot(&mut self, last_sent: Option<u64>) -> SnapshotRead {
        let Some(scene) = self.scene.as_mut() else {
            return SnapshotRead::NotConfigured;
        };

        if self.synchronous {
            scene.tick(SIMULATION_STEP);
            self.frame_tx.send_replace(scene.frame_number());
        } else if last_sent == Some(scene.frame_number()) {
            return SnapshotRead::Unchanged;
        }
        SnapshotRead::Fresh(scene.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(read: SnapshotRead) -> FrameSnapshot {
        match read {
            SnapshotRead::Fresh(snapshot) => snapshot,
            other => panic!("expected fresh snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_unconfigured_has_no_snapshot() {
        let mut state = SimulationState::new(SceneLayout::default());
        assert_eq!(state.read_snapshot(None), SnapshotRead::NotConfigured);
        state.tick();
        assert_eq!(state.read_snapshot(None), SnapshotRead::NotConfigured);
    }

    #[test]
    fn test_asynchronous_reads_wait_for_tick() {
        let mut state = SimulationState::new(SceneLayout::default());
        state.configure(&SessionSettings::default());
        let first = fresh(state.read_snapshot(None));
        assert_eq!(state.read_snapshot(Some(first.frame_number)), SnapshotRead::Unchanged);

        state.tick();
        let second = fresh(state.read_snapshot(Some(first.frame_number)));
        assert_eq!(second.frame_number, first.frame_number + 1);
    }

    #[test]
    fn test_reconfigure_restarts_frames() {
        let mut state = SimulationState::new(SceneLayout::default());
        state.configure(&SessionSettings::default());
        for _ in 0..5 {
            state.tick();
        }
        state.configure(&SessionSettings::default());
        let snapshot = fresh(state.read_snapshot(Some(5)));
        assert_eq!(snapshot.frame_number, 0);
    }

    #[test]
    fn test_ticks_are_published() {
        let mut state = SimulationState::new(SceneLayout::default());
        let mut frames = state.subscribe_frames();
        state.configure(&SessionSettings::default());
        state.tick();
        state.tick();
        assert!(frames.has_changed().unwrap());
        assert_eq!(*frames.borrow_and_update(), 2);
    }

    #[test]
    fn test_synchronous_reads_advance_one_step() {
        let mut state = SimulationState::new(SceneLayout::default());
        state.configure(&SessionSettings {
            synchronous_mode: true,
            ..Default::default()
        });

        state.tick();
        let first = fresh(state.read_snapshot(None));
        let second = fresh(state.read_snapshot(Some(first.frame_number)));
        assert_eq!(first.frame_number, 1);
        assert_eq!(second.frame_number, 2);
        assert_eq!(second.game_timestamp - first.game_timestamp, SIMULATION_STEP.as_millis() as u64);
    }
}
