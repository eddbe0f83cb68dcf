pub mod app;
pub mod game;
pub mod requests;
pub mod session;
pub mod view;

use std::time::Duration;

pub const WINDOW_WIDTH: f32 = 650.0;
pub const WINDOW_HEIGHT: f32 = 550.0;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 2000;
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:2000";
pub const DEFAULT_MAPS_DIR: &str = "maps";

/// Pause between a failed session and the next connection attempt.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
