use clap::builder::styling::RgbColor;

use crate::game::{
    math::{
        Rect2F,
        Vector2F,
        Vector3F
    },
    snapshot::AgentPose
};

use super::{
    projection::Projector,
    scale::ImageScale,
    PEDESTRIAN_COLOR,
    VEHICLE_COLOR
};

/// Marker extents in native image pixels.
pub const PEDESTRIAN_SIZE: Vector2F = Vector2F { x: 12.0, y: 12.0 };
pub const VEHICLE_SIZE: Vector2F = Vector2F { x: 16.0, y: 8.0 };

/// Axis-aligned box, drawn as the inscribed ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PedestrianMarker {
    pub rect: Rect2F,
    pub color: RgbColor,
}

/// Rotated rectangle. Vertices are `[c + left, c + right, c - left, c - right]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleMarker {
    pub vertices: [Vector2F; 4],
    pub color: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentShape {
    Pedestrian(PedestrianMarker),
    Vehicle(VehicleMarker),
}

impl AgentShape {
    pub fn color(&self) -> RgbColor {
        match self {
            AgentShape::Pedestrian(marker) => marker.color,
            AgentShape::Vehicle(marker) => marker.color,
        }
    }
}

/// Builds window-space markers for one session. Holds only the startup projection.
#[derive(Debug, Clone, Copy)]
pub struct ShapeBuilder {
    projector: Projector,
}

impl ShapeBuilder {
    pub fn new(projector: Projector) -> Self {
        Self { projector }
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn build_pedestrian(&self, world_position: Vector3F) -> PedestrianMarker {
        pedestrian_marker(self.projector.project(world_position), self.projector.scale())
    }

    pub fn build_vehicle(&self, pose: &AgentPose) -> VehicleMarker {
        vehicle_marker(self.projector.project(pose.position), pose.yaw, self.projector.scale())
    }
}

/// Pedestrian box centered on an already projected point.
pub fn pedestrian_marker(center: Vector2F, scale: ImageScale) -> PedestrianMarker {
    PedestrianMarker {
        rect: Rect2F::centered_at(center, scale.to_window(PEDESTRIAN_SIZE)),
        color: PEDESTRIAN_COLOR,
    }
}

/// Vehicle quad around an already projected center, `yaw` in degrees.
pub fn vehicle_marker(center: Vector2F, yaw: f32, scale: ImageScale) -> VehicleMarker {
    let size = scale.to_window(VEHICLE_SIZE);
    let half_diag = size.length() / 2.0;
    let half_angle = (size.y / 2.0).atan2(size.x / 2.0);
    let yaw_rad = yaw.rem_euclid(360.0).to_radians();

    let left = Vector2F::from_polar(half_diag, yaw_rad - half_angle);
    let right = Vector2F::from_polar(half_diag, yaw_rad + half_angle);

    VehicleMarker {
        vertices: [
            center + left,
            center + right,
            center - left,
            center - right,
        ],
        color: VEHICLE_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::map::MapTransform;

    const TOLERANCE: f32 = 1e-3;

    fn reference_scale() -> ImageScale {
        ImageScale { scale_x: 2.0, scale_y: 2.0 }
    }

    fn assert_close(a: Vector2F, b: Vector2F) {
        assert!((a - b).length() < TOLERANCE, "{a} != {b}");
    }

    fn extent(marker: &VehicleMarker) -> Vector2F {
        let xs = marker.vertices.iter().map(|v| v.x);
        let ys = marker.vertices.iter().map(|v| v.y);
        Vector2F::new(
            xs.clone().fold(f32::MIN, f32::max) - xs.fold(f32::MAX, f32::min),
            ys.clone().fold(f32::MIN, f32::max) - ys.fold(f32::MAX, f32::min),
        )
    }

    #[test]
    fn test_vehicle_at_zero_yaw() {
        // image pixel (100, 100) at scale 2 lands on (50, 50)
        let projector = Projector::new(MapTransform::new(1.0), reference_scale());
        let builder = ShapeBuilder::new(projector);
        let marker = builder.build_vehicle(&AgentPose {
            position: Vector3F::new(100.0, 100.0, 0.0),
            yaw: 0.0
        });

        assert_close(marker.vertices[0], Vector2F::new(54.0, 48.0));
        assert_close(marker.vertices[1], Vector2F::new(54.0, 52.0));
        assert_close(marker.vertices[2], Vector2F::new(46.0, 52.0));
        assert_close(marker.vertices[3], Vector2F::new(46.0, 48.0));
        assert_close(extent(&marker), Vector2F::new(8.0, 4.0));
        assert_eq!(marker.color, VEHICLE_COLOR);
    }

    #[test]
    fn test_vehicle_at_right_angle_swaps_extent() {
        let marker = vehicle_marker(Vector2F::new(50.0, 50.0), 90.0, reference_scale());
        assert_close(extent(&marker), Vector2F::new(4.0, 8.0));
        assert_close(marker.vertices[0], Vector2F::new(52.0, 54.0));
    }

    #[test]
    fn test_vehicle_diagonals_bisect_at_center() {
        let center = Vector2F::new(-13.5, 402.25);
        for yaw in [-725.0, -90.0, -1.0, 0.0, 33.3, 179.9, 270.0, 359.99, 1234.5] {
            let marker = vehicle_marker(center, yaw, ImageScale { scale_x: 1.7, scale_y: 3.1 });
            let [v1, v2, v3, v4] = marker.vertices;
            assert_close(v1 + v3, center * 2.0);
            assert_close(v2 + v4, center * 2.0);
        }
    }

    #[test]
    fn test_vehicle_yaw_is_periodic() {
        let center = Vector2F::new(320.0, 240.0);
        for yaw in [-180.0, -45.0, 0.0, 12.5, 90.0, 300.0] {
            let a = vehicle_marker(center, yaw, reference_scale());
            let b = vehicle_marker(center, yaw + 360.0, reference_scale());
            for (va, vb) in a.vertices.iter().zip(b.vertices.iter()) {
                assert_close(*va, *vb);
            }
        }
    }

    #[test]
    fn test_pedestrian_is_centered_and_rescaled() {
        let projector = Projector::new(MapTransform::new(0.5), ImageScale { scale_x: 2.0, scale_y: 3.0 });
        let builder = ShapeBuilder::new(projector);
        let world = Vector3F::new(30.0, 45.0, 0.0);

        let marker = builder.build_pedestrian(world);
        assert_close(marker.rect.center(), projector.project(world));
        assert_close(marker.rect.size, Vector2F::new(6.0, 4.0));
        assert_eq!(marker.color, PEDESTRIAN_COLOR);
    }

    #[test]
    fn test_shape_color_by_variant() {
        let scale = reference_scale();
        let pedestrian = AgentShape::Pedestrian(pedestrian_marker(Vector2F::default(), scale));
        let vehicle = AgentShape::Vehicle(vehicle_marker(Vector2F::default(), 0.0, scale));
        assert_eq!(pedestrian.color(), PEDESTRIAN_COLOR);
        assert_eq!(vehicle.color(), VEHICLE_COLOR);
    }
}
