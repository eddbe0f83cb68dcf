use crate::game::math::Vector2F;

use super::ConfigurationError;

/// Logical size of the display window, fixed for the whole session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: crate::WINDOW_WIDTH,
            height: crate::WINDOW_HEIGHT,
        }
    }
}

impl WindowConfig {
    pub fn size(&self) -> Vector2F {
        Vector2F::new(self.width, self.height)
    }
}

/// Native image size divided by window size, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageScale {
    pub scale_x: f32,
    pub scale_y: f32,
}

impl ImageScale {
    pub fn from_dimensions(image_size: (u32, u32), window: WindowConfig) -> Result<Self, ConfigurationError> {
        if !(window.width > 0.0 && window.height > 0.0) {
            return Err(ConfigurationError::InvalidWindow {
                width: window.width,
                height: window.height
            });
        }

        let (image_width, image_height) = image_size;
        let scale_x = image_width as f32 / window.width;
        let scale_y = image_height as f32 / window.height;

        if scale_x == 0.0 || scale_y == 0.0 {
            return Err(ConfigurationError::ZeroScale {
                image_width,
                image_height,
                window_width: window.width,
                window_height: window.height,
            });
        }

        log::debug!("Image {image_width}x{image_height} scaled by ({scale_x}, {scale_y})");
        Ok(Self { scale_x, scale_y })
    }

    pub fn as_vector(&self) -> Vector2F {
        Vector2F::new(self.scale_x, self.scale_y)
    }

    /// Image-space extent expressed in window pixels.
    pub fn to_window(&self, image_extent: Vector2F) -> Vector2F {
        image_extent.div_components(self.as_vector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_window_scale() {
        let scale = ImageScale::from_dimensions((1300, 1100), WindowConfig { width: 650.0, height: 550.0 }).unwrap();
        assert_eq!(scale.scale_x, 2.0);
        assert_eq!(scale.scale_y, 2.0);
    }

    #[test]
    fn test_scale_restores_image_size() {
        let cases = [
            ((1300, 1100), (650.0, 550.0)),
            ((4000, 3000), (650.0, 550.0)),
            ((17, 911), (3.0, 7.5)),
            ((1, 1), (1024.0, 768.0)),
        ];
        for ((image_width, image_height), (width, height)) in cases {
            let scale = ImageScale::from_dimensions((image_width, image_height), WindowConfig { width, height }).unwrap();
            assert!((scale.scale_x * width - image_width as f32).abs() < 1e-3);
            assert!((scale.scale_y * height - image_height as f32).abs() < 1e-3);
        }
    }

    #[test]
    fn test_zero_width_image_is_fatal() {
        let result = ImageScale::from_dimensions((0, 1100), WindowConfig::default());
        assert!(matches!(result, Err(ConfigurationError::ZeroScale { image_width: 0, .. })));
    }

    #[test]
    fn test_zero_height_image_is_fatal() {
        let result = ImageScale::from_dimensions((1300, 0), WindowConfig::default());
        assert!(matches!(result, Err(ConfigurationError::ZeroScale { .. })));
    }

    #[test]
    fn test_empty_window_is_rejected() {
        let result = ImageScale::from_dimensions((1300, 1100), WindowConfig { width: 0.0, height: 550.0 });
        assert!(matches!(result, Err(ConfigurationError::InvalidWindow { .. })));
    }
}
