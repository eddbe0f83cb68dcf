use bytemuck::{
    Pod,
    Zeroable
};
use clap::builder::styling::RgbColor;

use crate::{
    game::math::{
        Rect2F,
        Vector2F
    },
    view::{
        overlay::OverlayBox,
        shapes::AgentShape
    }
};

/// Triangles per pedestrian ellipse.
pub const ELLIPSE_SEGMENTS: usize = 16;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShapeVertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

impl ShapeVertex {
    fn new(ndc: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            position: [ndc[0], ndc[1], 0.0, 1.0],
            color,
        }
    }
}

/// Window pixel (origin top-left, y down) to normalized device coordinates.
pub fn pixel_to_ndc(point: Vector2F, window_size: Vector2F) -> [f32; 2] {
    [
        (point.x / window_size.x) * 2.0 - 1.0,
        1.0 - (point.y / window_size.y) * 2.0,
    ]
}

pub fn color_to_f32(color: RgbColor) -> [f32; 4] {
    [
        color.0 as f32 / 255.0,
        color.1 as f32 / 255.0,
        color.2 as f32 / 255.0,
        1.0
    ]
}

pub fn rect_triangles(rect: &Rect2F) -> Vec<Vector2F> {
    let top_left = rect.pos;
    let top_right = rect.pos + Vector2F::new(rect.size.x, 0.0);
    let bottom_right = rect.pos + rect.size;
    let bottom_left = rect.pos + Vector2F::new(0.0, rect.size.y);
    vec![
        top_left, top_right, bottom_right,
        bottom_right, bottom_left, top_left,
    ]
}

/// Convex polygon as a triangle fan around its first vertex.
pub fn polygon_triangles(vertices: &[Vector2F]) -> Vec<Vector2F> {
    if vertices.len() < 3 {
        return Vec::new();
    }
    vertices[1..].windows(2)
        .flat_map(|pair| [vertices[0], pair[0], pair[1]])
        .collect()
}

/// Ellipse inscribed in `rect`, fanned around its center.
pub fn ellipse_triangles(rect: &Rect2F, segments: usize) -> Vec<Vector2F> {
    let center = rect.center();
    let radius = rect.size / 2.0;
    let rim = |i: usize| {
        let angle = std::f32::consts::TAU * (i % segments) as f32 / segments as f32;
        center + Vector2F::new(radius.x * angle.cos(), radius.y * angle.sin())
    };

    (0..segments)
        .flat_map(|i| [center, rim(i), rim(i + 1)])
        .collect()
}

/// Colored triangles of one frame, in window pixels until converted for upload.
#[derive(Debug, Clone, Default)]
pub struct FrameBatch {
    triangles: Vec<(Vector2F, [f32; 4])>,
}

impl FrameBatch {
    pub fn clear(&mut self) {
        self.triangles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn push_overlay_box(&mut self, overlay_box: &OverlayBox) {
        self.extend(rect_triangles(&overlay_box.rect), overlay_box.color);
    }

    pub fn push_shape(&mut self, shape: &AgentShape) {
        let points = match shape {
            AgentShape::Pedestrian(marker) => ellipse_triangles(&marker.rect, ELLIPSE_SEGMENTS),
            AgentShape::Vehicle(marker) => polygon_triangles(&marker.vertices),
        };
        self.extend(points, shape.color());
    }

    fn extend(&mut self, points: Vec<Vector2F>, color: RgbColor) {
        let color = color_to_f32(color);
        self.triangles.extend(points.into_iter().map(|point| (point, color)));
    }

    pub fn to_vertices(&self, window_size: Vector2F) -> Vec<ShapeVertex> {
        self.triangles.iter()
            .map(|(point, color)| ShapeVertex::new(pixel_to_ndc(*point, window_size), *color))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{
        scale::ImageScale,
        shapes::{
            pedestrian_marker,
            vehicle_marker
        },
        PEDESTRIAN_COLOR,
        START_SPOT_COLOR
    };

    fn triangle_area(a: Vector2F, b: Vector2F, c: Vector2F) -> f32 {
        ((b - a).x * (c - a).y - (b - a).y * (c - a).x).abs() / 2.0
    }

    fn total_area(points: &[Vector2F]) -> f32 {
        points.chunks(3).map(|t| triangle_area(t[0], t[1], t[2])).sum()
    }

    #[test]
    fn test_ndc_corners() {
        let window = Vector2F::new(650.0, 550.0);
        assert_eq!(pixel_to_ndc(Vector2F::default(), window), [-1.0, 1.0]);
        assert_eq!(pixel_to_ndc(window, window), [1.0, -1.0]);
        assert_eq!(pixel_to_ndc(window / 2.0, window), [0.0, 0.0]);
    }

    #[test]
    fn test_rect_covers_its_area() {
        let rect = Rect2F::new(3.0, 4.0, 10.0, 6.0);
        let points = rect_triangles(&rect);
        assert_eq!(points.len(), 6);
        assert!((total_area(&points) - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_vehicle_quad_fan() {
        let marker = vehicle_marker(Vector2F::new(50.0, 50.0), 30.0, ImageScale { scale_x: 2.0, scale_y: 2.0 });
        let points = polygon_triangles(&marker.vertices);
        assert_eq!(points.len(), 6);
        assert!((total_area(&points) - 8.0 * 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_polygon_is_empty() {
        assert!(polygon_triangles(&[Vector2F::default(), Vector2F::new(1.0, 1.0)]).is_empty());
    }

    #[test]
    fn test_ellipse_approaches_area() {
        let rect = Rect2F::new(0.0, 0.0, 6.0, 4.0);
        let points = ellipse_triangles(&rect, 64);
        assert_eq!(points.len(), 64 * 3);
        let expected = std::f32::consts::PI * 3.0 * 2.0;
        assert!((total_area(&points) - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_batch_collects_colored_vertices() {
        let mut batch = FrameBatch::default();
        assert!(batch.is_empty());

        batch.push_overlay_box(&OverlayBox { rect: Rect2F::new(0.0, 0.0, 5.0, 5.0), color: START_SPOT_COLOR });
        batch.push_shape(&AgentShape::Pedestrian(pedestrian_marker(
            Vector2F::new(100.0, 100.0),
            ImageScale { scale_x: 2.0, scale_y: 2.0 }
        )));

        let vertices = batch.to_vertices(Vector2F::new(650.0, 550.0));
        assert_eq!(vertices.len(), 6 + ELLIPSE_SEGMENTS * 3);
        assert_eq!(vertices[0].color, color_to_f32(START_SPOT_COLOR));
        assert_eq!(vertices[6].color, color_to_f32(PEDESTRIAN_COLOR));
        assert_eq!(vertices[0].position, [-1.0, 1.0, 0.0, 1.0]);

        batch.clear();
        assert!(batch.is_empty());
    }
}
