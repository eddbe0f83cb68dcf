pub mod client;

use serde::{
    Deserialize,
    Serialize
};

use crate::game::snapshot::{
    FrameSnapshot,
    Transform
};

pub use client::SimulatorClient;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Connectivity error, reason='{0}'")]
    Connectivity(#[from] std::io::Error),

    #[error("Simulator did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Simulator closed the connection")]
    Disconnected,

    #[error("Protocol error, reason='{0}'")]
    Protocol(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLevel {
    #[default]
    Low,
    Epic,
}

impl std::str::FromStr for QualityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "epic" => Ok(Self::Epic),
            other => Err(format!("unknown quality level '{other}', expected 'Low' or 'Epic'")),
        }
    }
}

/// Episode settings sent to the simulator on `Configure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub synchronous_mode: bool,
    pub send_non_player_agents_info: bool,
    pub number_of_vehicles: u32,
    pub number_of_pedestrians: u32,
    pub weather_id: u32,
    pub quality_level: QualityLevel,
    pub seed_vehicles: Option<u64>,
    pub seed_pedestrians: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            synchronous_mode: false,
            send_non_player_agents_info: true,
            number_of_vehicles: 3,
            number_of_pedestrians: 40,
            weather_id: 1,
            quality_level: QualityLevel::Low,
            seed_vehicles: None,
            seed_pedestrians: None,
        }
    }
}

impl SessionSettings {
    pub fn randomize_seeds(&mut self) {
        self.seed_vehicles = Some(rand::random());
        self.seed_pedestrians = Some(rand::random());
    }
}

/// Scene metadata returned by the simulator after `Configure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub map_name: String,
    pub player_start_spots: Vec<Transform>,
}

/// Blocking read of the most recent simulation tick.
pub trait SnapshotSource {
    fn read_snapshot(&mut self) -> Result<FrameSnapshot, SessionError>;
}

pub trait SimulationSession: SnapshotSource {
    fn ping(&mut self) -> Result<(), SessionError>;

    fn configure(&mut self, settings: &SessionSettings) -> Result<SceneDescription, SessionError>;

    fn start_episode(&mut self, player_start_index: usize) -> Result<(), SessionError>;
}

#[test]
fn test_randomize_seeds_fills_both() {
    let mut settings = SessionSettings::default();
    assert!(settings.seed_vehicles.is_none());
    settings.randomize_seeds();
    assert!(settings.seed_vehicles.is_some());
    assert!(settings.seed_pedestrians.is_some());
}

#[test]
fn test_quality_level_parsing() {
    assert_eq!("low".parse::<QualityLevel>(), Ok(QualityLevel::Low));
    assert_eq!("Epic".parse::<QualityLevel>(), Ok(QualityLevel::Epic));
    assert!("ultra".parse::<QualityLevel>().is_err());
}
