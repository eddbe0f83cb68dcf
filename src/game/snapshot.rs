use serde::{
    Deserialize,
    Serialize
};

use super::math::Vector3F;

pub type AgentId = u32;

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rotation3D {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vector3F,
    pub rotation: Rotation3D,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficLightState {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgentKind {
    Vehicle {
        transform: Transform,
        forward_speed: f32,
    },
    Pedestrian {
        transform: Transform,
        forward_speed: f32,
    },
    SpeedLimitSign {
        transform: Transform,
        speed_limit: f32,
    },
    TrafficLight {
        transform: Transform,
        state: TrafficLightState,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
}

/// All non-player agents reported for one simulation tick.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame_number: u64,
    /// Server wall clock, milliseconds since Unix epoch.
    pub platform_timestamp: i64,
    /// Simulated time, milliseconds since episode start.
    pub game_timestamp: u64,
    pub agents: Vec<Agent>,
}

/// Vehicle position and heading, yaw in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AgentPose {
    pub position: Vector3F,
    pub yaw: f32,
}

/// Typed view over a snapshot, consumed once per frame.
#[derive(Debug, Default, PartialEq)]
pub struct AgentPartition {
    pub pedestrians: Vec<Vector3F>,
    pub vehicles: Vec<AgentPose>,
}

impl FrameSnapshot {
    /// Splits agents by kind. Signs and traffic lights are not drawn and are dropped.
    pub fn partition(&self) -> AgentPartition {
        self.agents.iter().fold(AgentPartition::default(), |mut partition, agent| {
            match &agent.kind {
                AgentKind::Pedestrian { transform, forward_speed: _ } => {
                    partition.pedestrians.push(transform.location);
                },
                AgentKind::Vehicle { transform, forward_speed: _ } => {
                    partition.vehicles.push(AgentPose {
                        position: transform.location,
                        yaw: transform.rotation.yaw,
                    });
                },
                AgentKind::SpeedLimitSign { .. } | AgentKind::TrafficLight { .. } => {},
            }
            partition
        })
    }

    pub fn count_pedestrians(&self) -> usize {
        self.agents.iter()
            .filter(|a| matches!(a.kind, AgentKind::Pedestrian { .. }))
            .count()
    }

    pub fn count_vehicles(&self) -> usize {
        self.agents.iter()
            .filter(|a| matches!(a.kind, AgentKind::Vehicle { .. }))
            .count()
    }
}

impl Transform {
    pub fn at(location: Vector3F, yaw: f32) -> Self {
        Self {
            location,
            rotation: Rotation3D { yaw, ..Default::default() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_snapshot() -> FrameSnapshot {
        FrameSnapshot {
            frame_number: 12,
            agents: vec![
                Agent {
                    id: 1,
                    kind: AgentKind::Pedestrian {
                        transform: Transform::at(Vector3F::new(1.0, 2.0, 0.0), 0.0),
                        forward_speed: 1.2,
                    },
                },
                Agent {
                    id: 2,
                    kind: AgentKind::Vehicle {
                        transform: Transform::at(Vector3F::new(5.0, 6.0, 0.0), 45.0),
                        forward_speed: 8.0,
                    },
                },
                Agent {
                    id: 3,
                    kind: AgentKind::TrafficLight {
                        transform: Transform::default(),
                        state: TrafficLightState::Red,
                    },
                },
                Agent {
                    id: 4,
                    kind: AgentKind::SpeedLimitSign {
                        transform: Transform::default(),
                        speed_limit: 30.0,
                    },
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_partition_splits_by_kind() {
        let snapshot = mixed_snapshot();
        let partition = snapshot.partition();

        assert_eq!(partition.pedestrians, vec![Vector3F::new(1.0, 2.0, 0.0)]);
        assert_eq!(partition.vehicles, vec![AgentPose {
            position: Vector3F::new(5.0, 6.0, 0.0),
            yaw: 45.0
        }]);
        assert_eq!(snapshot.count_pedestrians(), 1);
        assert_eq!(snapshot.count_vehicles(), 1);
    }

    #[test]
    fn test_partition_leaves_snapshot_untouched() {
        let snapshot = mixed_snapshot();
        let before = snapshot.clone();
        let _ = snapshot.partition();
        let _ = snapshot.partition();
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_string(&mixed_snapshot().agents[0]).unwrap();
        assert!(json.contains("\"type\":\"Pedestrian\""));
    }
}
