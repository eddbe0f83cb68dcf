use crate::game::math::{
    Vector2F,
    Vector3F
};

use super::{
    map::MapTransform,
    scale::ImageScale
};

/// World to window projection. World to image first, image to window second, since the
/// map calibration is defined against native image resolution.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    transform: MapTransform,
    scale: ImageScale,
}

impl Projector {
    pub fn new(transform: MapTransform, scale: ImageScale) -> Self {
        Self { transform, scale }
    }

    pub fn scale(&self) -> ImageScale {
        self.scale
    }

    pub fn project_to_image(&self, world: Vector3F) -> Vector2F {
        self.transform.convert_to_pixel(world)
    }

    /// Window pixel of a world position. Out of window results are kept, the renderer clips.
    pub fn project(&self, world: Vector3F) -> Vector2F {
        self.scale.to_window(self.project_to_image(world))
    }
}
