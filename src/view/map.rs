use std::path::{
    Path,
    PathBuf
};

use serde::{
    Deserialize,
    Serialize
};

use crate::game::math::{
    Vector2F,
    Vector3F
};

use super::ConfigurationError;

/// Calibration between world meters and native map-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapTransform {
    /// World meters covered by one image pixel.
    pub pixel_density: f32,
    #[serde(default)]
    pub world_offset: Vector3F,
    #[serde(default)]
    pub map_offset: Vector3F,
    #[serde(default)]
    pub world_rotation_deg: f32,
}

impl MapTransform {
    pub fn new(pixel_density: f32) -> Self {
        Self {
            pixel_density,
            world_offset: Vector3F::default(),
            map_offset: Vector3F::default(),
            world_rotation_deg: 0.0,
        }
    }

    /// World position to native image pixel. Not floored, keeps the mapping linear.
    pub fn convert_to_pixel(&self, world: Vector3F) -> Vector2F {
        let relative = world.rotated_z(self.world_rotation_deg) + self.world_offset - self.map_offset;
        Vector2F::new(
            relative.x / self.pixel_density,
            relative.y / self.pixel_density
        )
    }
}

/// On-disk description of a map, `<maps_dir>/<map_name>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDescriptor {
    /// Image file, relative to the descriptor.
    pub image: PathBuf,
    #[serde(flatten)]
    pub transform: MapTransform,
}

pub struct MapData {
    pub name: String,
    pub transform: MapTransform,
    pub image: image::RgbaImage,
}

impl std::fmt::Debug for MapData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapData")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("image_size", &self.image.dimensions())
            .finish()
    }
}

impl MapDescriptor {
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::MapDescriptorIo {
            path: path.to_path_buf(),
            source
        })?;
        let descriptor: MapDescriptor = serde_json::from_str(&content).map_err(|source| ConfigurationError::MapDescriptorFormat {
            path: path.to_path_buf(),
            source
        })?;

        if !(descriptor.transform.pixel_density > 0.0) {
            return Err(ConfigurationError::InvalidPixelDensity(descriptor.transform.pixel_density));
        }
        Ok(descriptor)
    }
}

impl MapData {
    pub fn load(maps_dir: &Path, map_name: &str) -> Result<Self, ConfigurationError> {
        let descriptor_path = maps_dir.join(format!("{map_name}.json"));
        let descriptor = MapDescriptor::load(&descriptor_path)?;

        let image_path = maps_dir.join(&descriptor.image);
        let image = image::open(&image_path)
            .map_err(|source| ConfigurationError::MapImage {
                path: image_path.clone(),
                source
            })?
            .into_rgba8();

        log::info!("Loaded map '{map_name}' from {}, image {}x{}", image_path.display(), image.width(), image.height());
        Ok(Self {
            name: map_name.to_string(),
            transform: descriptor.transform,
            image,
        })
    }

    pub fn image_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_density_conversion() {
        let transform = MapTransform::new(0.5);
        let pixel = transform.convert_to_pixel(Vector3F::new(10.0, 4.0, 3.0));
        assert_eq!(pixel, Vector2F::new(20.0, 8.0));
    }

    #[test]
    fn test_offsets_and_rotation() {
        let transform = MapTransform {
            pixel_density: 1.0,
            world_offset: Vector3F::new(100.0, 0.0, 0.0),
            map_offset: Vector3F::new(0.0, 50.0, 0.0),
            world_rotation_deg: 90.0,
        };
        let pixel = transform.convert_to_pixel(Vector3F::new(10.0, 0.0, 0.0));
        assert!((pixel.x - 100.0).abs() < 1e-4);
        assert!((pixel.y - (-40.0)).abs() < 1e-4);
    }

    #[test]
    fn test_descriptor_parsing() {
        let json = r#"{"image": "Town01.png", "pixel_density": 0.1653, "map_offset": {"x": 1.0, "y": 2.0, "z": 0.0}}"#;
        let descriptor: MapDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.image, PathBuf::from("Town01.png"));
        assert_eq!(descriptor.transform.pixel_density, 0.1653);
        assert_eq!(descriptor.transform.map_offset, Vector3F::new(1.0, 2.0, 0.0));
        assert_eq!(descriptor.transform.world_rotation_deg, 0.0);
    }

    #[test]
    fn test_bundled_map_loads() {
        let maps_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("maps");
        let map = MapData::load(&maps_dir, "Town01").unwrap();
        assert_eq!(map.image_size(), (1300, 1100));
        assert_eq!(map.transform.pixel_density, 0.1653);
    }

    #[test]
    fn test_missing_descriptor_is_configuration_error() {
        let result = MapData::load(Path::new("does-not-exist"), "Nowhere");
        assert!(matches!(result, Err(ConfigurationError::MapDescriptorIo { .. })));
    }

    #[test]
    fn test_non_positive_density_is_rejected() {
        let dir = std::env::temp_dir().join(format!("agent_map_view_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Broken.json"), r#"{"image": "Broken.png", "pixel_density": 0.0}"#).unwrap();

        let result = MapData::load(&dir, "Broken");
        assert!(matches!(result, Err(ConfigurationError::InvalidPixelDensity(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
