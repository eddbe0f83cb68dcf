use std::time::Duration;

use rand::{
    rngs::StdRng,
    Rng,
    SeedableRng
};

use super::{
    math::{
        Rect2F,
        Vector2F,
        Vector3F
    },
    snapshot::{
        Agent,
        AgentId,
        AgentKind,
        FrameSnapshot,
        TrafficLightState,
        Transform
    }
};
use crate::session::{
    SceneDescription,
    SessionSettings
};

const VEHICLE_SPEED_RANGE: std::ops::Range<f32> = 6.0..12.0;
const PEDESTRIAN_SPEED_RANGE: std::ops::Range<f32> = 0.8..1.8;
const SIDEWALK_OFFSET: f32 = 2.5;

const GREEN_PHASE_MS: u64 = 10_000;
const YELLOW_PHASE_MS: u64 = 3_000;
const RED_PHASE_MS: u64 = 10_000;
const LIGHT_CYCLE_MS: u64 = GREEN_PHASE_MS + YELLOW_PHASE_MS + RED_PHASE_MS;

/// Static layout of the world served by the demo simulator.
#[derive(Debug, Clone)]
pub struct SceneLayout {
    pub map_name: String,
    /// Drivable area in world meters.
    pub bounds: Rect2F,
    pub block_size: f32,
    pub start_spot_count: usize,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            map_name: String::from("Town01"),
            bounds: Rect2F::new(10.0, 10.0, 195.0, 162.0),
            block_size: 40.0,
            start_spot_count: 16,
        }
    }
}

/// Polyline an agent follows, either looping or walking back and forth.
#[derive(Debug, Clone)]
pub struct Route {
    waypoints: Vec<Vector2F>,
    closed: bool,
    length: f32,
}

impl Route {
    pub fn new(waypoints: Vec<Vector2F>, closed: bool) -> Self {
        let mut route = Self { waypoints, closed, length: 0.0 };
        route.length = route.segments().map(|(a, b)| a.distance(b)).sum();
        route
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    fn segments(&self) -> impl Iterator<Item = (Vector2F, Vector2F)> + '_ {
        let closing = match (self.closed, self.waypoints.first(), self.waypoints.last()) {
            (true, Some(first), Some(last)) if self.waypoints.len() > 2 => Some((*last, *first)),
            _ => None,
        };
        self.waypoints.windows(2)
            .map(|w| (w[0], w[1]))
            .chain(closing)
    }

    /// Position and heading (degrees) after travelling `distance` from the first waypoint.
    /// Open routes are walked back and forth.
    pub fn sample(&self, distance: f32) -> (Vector2F, f32) {
        if self.length <= f32::EPSILON {
            return (self.waypoints.first().copied().unwrap_or_default(), 0.0);
        }

        let (mut remaining, reversed) = if self.closed {
            (distance.rem_euclid(self.length), false)
        } else {
            let folded = distance.rem_euclid(2.0 * self.length);
            if folded > self.length {
                (2.0 * self.length - folded, true)
            } else {
                (folded, false)
            }
        };

        let mut last = (self.waypoints[0], 0.0);
        for (from, to) in self.segments() {
            let segment = to - from;
            let segment_length = segment.length();
            let heading = segment.y.atan2(segment.x).to_degrees();
            let heading = if reversed { heading + 180.0 } else { heading };

            if remaining <= segment_length && segment_length > 0.0 {
                let position = from + segment * (remaining / segment_length);
                return (position, heading.rem_euclid(360.0));
            }
            remaining -= segment_length;
            last = (to, heading.rem_euclid(360.0));
        }
        last
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScriptedRole {
    Vehicle,
    Pedestrian,
}

#[derive(Debug, Clone)]
struct ScriptedAgent {
    id: AgentId,
    role: ScriptedRole,
    route: Route,
    speed: f32,
    travelled: f32,
}

#[derive(Debug, Clone)]
struct TrafficLight {
    id: AgentId,
    transform: Transform,
    phase_offset_ms: u64,
}

/// Scripted scene ticked by the demo server. Agents replay routes at constant speed.
#[derive(Debug)]
pub struct Scene {
    layout: SceneLayout,
    frame_number: u64,
    game_time_ms: u64,
    agents: Vec<ScriptedAgent>,
    traffic_lights: Vec<TrafficLight>,
    speed_signs: Vec<Agent>,
    start_spots: Vec<Transform>,
    include_agents: bool,
}

impl Scene {
    pub fn new(layout: SceneLayout, settings: &SessionSettings) -> Self {
        let mut vehicles_rng = StdRng::seed_from_u64(settings.seed_vehicles.unwrap_or_else(rand::random));
        let mut pedestrians_rng = StdRng::seed_from_u64(settings.seed_pedestrians.unwrap_or_else(rand::random));

        let mut next_id: AgentId = 0;
        let mut take_id = || {
            let id = next_id;
            next_id += 1;
            id
        };

        let mut agents = Vec::new();
        for _ in 0..settings.number_of_vehicles {
            let block = Self::random_block(&layout, &mut vehicles_rng);
            let route = Route::new(Self::block_corners(&block), true);
            agents.push(ScriptedAgent {
                id: take_id(),
                role: ScriptedRole::Vehicle,
                travelled: vehicles_rng.random_range(0.0..route.length().max(1.0)),
                speed: vehicles_rng.random_range(VEHICLE_SPEED_RANGE),
                route,
            });
        }

        for _ in 0..settings.number_of_pedestrians {
            let block = Self::random_block(&layout, &mut pedestrians_rng);
            let corners = Self::block_corners(&Rect2F::new(
                block.pos.x + SIDEWALK_OFFSET,
                block.pos.y + SIDEWALK_OFFSET,
                block.size.x - 2.0 * SIDEWALK_OFFSET,
                block.size.y - 2.0 * SIDEWALK_OFFSET
            ));
            let side = pedestrians_rng.random_range(0..corners.len());
            let route = Route::new(vec![corners[side], corners[(side + 1) % corners.len()]], false);
            agents.push(ScriptedAgent {
                id: take_id(),
                role: ScriptedRole::Pedestrian,
                travelled: pedestrians_rng.random_range(0.0..route.length().max(1.0)),
                speed: pedestrians_rng.random_range(PEDESTRIAN_SPEED_RANGE),
                route,
            });
        }

        let bounds = layout.bounds;
        let traffic_lights = [
            bounds.pos,
            bounds.pos + Vector2F::new(bounds.size.x, 0.0),
            bounds.pos + bounds.size,
            bounds.pos + Vector2F::new(0.0, bounds.size.y),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, corner)| TrafficLight {
            id: take_id(),
            transform: Transform::at(Vector3F::new(corner.x, corner.y, 0.0), 0.0),
            phase_offset_ms: i as u64 * (LIGHT_CYCLE_MS / 4),
        })
        .collect();

        let center = bounds.center();
        let speed_signs = vec![Agent {
            id: take_id(),
            kind: AgentKind::SpeedLimitSign {
                transform: Transform::at(Vector3F::new(center.x, center.y, 0.0), 0.0),
                speed_limit: 30.0,
            },
        }];

        let start_spots = Self::start_spots(&layout);

        log::info!(
            "Scene '{}' created: {} vehicles, {} pedestrians, {} start spots",
            layout.map_name, settings.number_of_vehicles, settings.number_of_pedestrians, start_spots.len()
        );

        Self {
            layout,
            frame_number: 0,
            game_time_ms: 0,
            agents,
            traffic_lights,
            speed_signs,
            start_spots,
            include_agents: settings.send_non_player_agents_info,
        }
    }

    fn random_block<R: Rng>(layout: &SceneLayout, rng: &mut R) -> Rect2F {
        let columns = ((layout.bounds.size.x / layout.block_size).floor() as u32).max(1);
        let rows = ((layout.bounds.size.y / layout.block_size).floor() as u32).max(1);
        let column = rng.random_range(0..columns);
        let row = rng.random_range(0..rows);
        Rect2F::new(
            layout.bounds.pos.x + column as f32 * layout.block_size,
            layout.bounds.pos.y + row as f32 * layout.block_size,
            layout.block_size.min(layout.bounds.size.x),
            layout.block_size.min(layout.bounds.size.y),
        )
    }

    fn block_corners(block: &Rect2F) -> Vec<Vector2F> {
        vec![
            block.pos,
            block.pos + Vector2F::new(block.size.x, 0.0),
            block.pos + block.size,
            block.pos + Vector2F::new(0.0, block.size.y),
        ]
    }

    fn start_spots(layout: &SceneLayout) -> Vec<Transform> {
        let count = layout.start_spot_count;
        let columns = (count as f32).sqrt().ceil().max(1.0) as usize;
        let rows = count.div_ceil(columns).max(1);
        let cell = Vector2F::new(
            layout.bounds.size.x / columns as f32,
            layout.bounds.size.y / rows as f32
        );

        (0..count)
            .map(|i| {
                let column = (i % columns) as f32;
                let row = (i / columns) as f32;
                let position = layout.bounds.pos + Vector2F::new(
                    (column + 0.5) * cell.x,
                    (row + 0.5) * cell.y
                );
                Transform::at(Vector3F::new(position.x, position.y, 0.0), ((i * 90) % 360) as f32)
            })
            .collect()
    }

    pub fn description(&self) -> SceneDescription {
        SceneDescription {
            map_name: self.layout.map_name.clone(),
            player_start_spots: self.start_spots.clone(),
        }
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn tick(&mut self, dt: Duration) {
        let dt_secs = dt.as_secs_f32();
        self.frame_number += 1;
        self.game_time_ms += dt.as_millis() as u64;
        self.agents.iter_mut().for_each(|agent| {
            agent.travelled += agent.speed * dt_secs;
        });
        log::trace!("Scene tick {}, t={}ms", self.frame_number, self.game_time_ms);
    }

    pub fn traffic_light_state(game_time_ms: u64, phase_offset_ms: u64) -> TrafficLightState {
        let phase = (game_time_ms + phase_offset_ms) % LIGHT_CYCLE_MS;
        if phase < GREEN_PHASE_MS {
            TrafficLightState::Green
        } else if phase < GREEN_PHASE_MS + YELLOW_PHASE_MS {
            TrafficLightState::Yellow
        } else {
            TrafficLightState::Red
        }
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let agents = if self.include_agents {
            let moving = self.agents.iter().map(|agent| {
                let (position, heading) = agent.route.sample(agent.travelled);
                let transform = Transform::at(Vector3F::new(position.x, position.y, 0.0), heading);
                let kind = match agent.role {
                    ScriptedRole::Vehicle => AgentKind::Vehicle { transform, forward_speed: agent.speed },
                    ScriptedRole::Pedestrian => AgentKind::Pedestrian { transform, forward_speed: agent.speed },
                };
                Agent { id: agent.id, kind }
            });

            let lights = self.traffic_lights.iter().map(|light| Agent {
                id: light.id,
                kind: AgentKind::TrafficLight {
                    transform: light.transform,
                    state: Self::traffic_light_state(self.game_time_ms, light.phase_offset_ms),
                },
            });

            moving.chain(lights)
                .chain(self.speed_signs.iter().cloned())
                .collect()
        } else {
            vec![]
        };

        FrameSnapshot {
            frame_number: self.frame_number,
            platform_timestamp: chrono::Utc::now().timestamp_millis(),
            game_timestamp: self.game_time_ms,
            agents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_settings() -> SessionSettings {
        SessionSettings {
            seed_vehicles: Some(7),
            seed_pedestrians: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn test_closed_route_wraps() {
        let route = Route::new(vec![
            Vector2F::new(0.0, 0.0),
            Vector2F::new(10.0, 0.0),
            Vector2F::new(10.0, 10.0),
            Vector2F::new(0.0, 10.0),
        ], true);
        assert_eq!(route.length(), 40.0);

        let (position, heading) = route.sample(15.0);
        assert!((position - Vector2F::new(10.0, 5.0)).length() < 1e-4);
        assert!((heading - 90.0).abs() < 1e-4);

        let (wrapped, _) = route.sample(55.0);
        assert!((wrapped - position).length() < 1e-4);
    }

    #[test]
    fn test_open_route_walks_back() {
        let route = Route::new(vec![Vector2F::new(0.0, 0.0), Vector2F::new(10.0, 0.0)], false);

        let (forward, forward_heading) = route.sample(4.0);
        assert!((forward.x - 4.0).abs() < 1e-4);
        assert!(forward_heading.abs() < 1e-4);

        let (backward, backward_heading) = route.sample(16.0);
        assert!((backward.x - 4.0).abs() < 1e-4);
        assert!((backward_heading - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_traffic_light_cycle() {
        assert_eq!(Scene::traffic_light_state(0, 0), TrafficLightState::Green);
        assert_eq!(Scene::traffic_light_state(GREEN_PHASE_MS, 0), TrafficLightState::Yellow);
        assert_eq!(Scene::traffic_light_state(GREEN_PHASE_MS + YELLOW_PHASE_MS, 0), TrafficLightState::Red);
        assert_eq!(Scene::traffic_light_state(LIGHT_CYCLE_MS, 0), TrafficLightState::Green);
    }

    #[test]
    fn test_scene_spawns_requested_agents() {
        let scene = Scene::new(SceneLayout::default(), &seeded_settings());
        let snapshot = scene.snapshot();
        assert_eq!(snapshot.count_vehicles(), 3);
        assert_eq!(snapshot.count_pedestrians(), 40);
        assert_eq!(scene.description().player_start_spots.len(), 16);
    }

    #[test]
    fn test_seeded_scenes_match() {
        let a = Scene::new(SceneLayout::default(), &seeded_settings()).snapshot();
        let b = Scene::new(SceneLayout::default(), &seeded_settings()).snapshot();
        assert_eq!(a.agents, b.agents);
    }

    #[test]
    fn test_agents_stay_inside_bounds() {
        let layout = SceneLayout::default();
        let bounds = layout.bounds;
        let mut scene = Scene::new(layout, &seeded_settings());
        for _ in 0..200 {
            scene.tick(Duration::from_millis(32));
        }
        let (min, max) = (bounds.pos, bounds.pos + bounds.size);
        for pose in scene.snapshot().partition().vehicles {
            let p = pose.position;
            assert!(
                p.x >= min.x - 0.01 && p.x <= max.x + 0.01 && p.y >= min.y - 0.01 && p.y <= max.y + 0.01,
                "vehicle left bounds: {p}"
            );
        }
        assert_eq!(scene.frame_number(), 200);
    }

    #[test]
    fn test_agents_info_can_be_disabled() {
        let settings = SessionSettings {
            send_non_player_agents_info: false,
            ..seeded_settings()
        };
        let scene = Scene::new(SceneLayout::default(), &settings);
        assert!(scene.snapshot().agents.is_empty());
    }
}
