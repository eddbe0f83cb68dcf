//! Frame projection and agent geometry.
//!
//! World positions go through two stages: the map calibration turns world meters into
//! native image pixels ([`map::MapTransform`]), then [`scale::ImageScale`] brings image
//! pixels down to the fixed window. Shapes are rebuilt from scratch every frame.

pub mod scale;
pub mod map;
pub mod projection;
pub mod shapes;
pub mod overlay;
pub mod frame_loop;

use clap::builder::styling::RgbColor;

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Can't convert image to screen size, image={image_width}x{image_height}, window={window_width}x{window_height}")]
    ZeroScale {
        image_width: u32,
        image_height: u32,
        window_width: f32,
        window_height: f32,
    },

    #[error("Window size must be positive, got {width}x{height}")]
    InvalidWindow {
        width: f32,
        height: f32,
    },

    #[error("Could not read map descriptor '{path}', reason='{source}'")]
    MapDescriptorIo {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid map descriptor '{path}', reason='{source}'")]
    MapDescriptorFormat {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid pixel density {0}, must be positive")]
    InvalidPixelDensity(f32),

    #[error("Could not load map image '{path}', reason='{source}'")]
    MapImage {
        path: std::path::PathBuf,
        source: image::ImageError,
    },
}

pub const PEDESTRIAN_COLOR: RgbColor = RgbColor(102, 153, 51);
pub const VEHICLE_COLOR: RgbColor = RgbColor(153, 51, 0);
pub const START_SPOT_COLOR: RgbColor = RgbColor(30, 90, 200);
pub const LABEL_COLOR: RgbColor = RgbColor(20, 20, 20);
